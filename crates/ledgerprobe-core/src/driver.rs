//! The measurement loop.
//!
//! Walks `[start_height, end_height)` one block at a time. For each height it
//! resolves the hash, times the body fetch alone, derives the metadata and
//! hands a row to the sink. A failing height is logged and skipped; only sink
//! failures stop the loop.

use crate::error::{FetchError, FetchPhase, ProbeError};
use crate::ledger::Ledger;
use crate::metadata::MetadataExtractor;
use crate::reader::RecordReader;
use crate::report::{AccessMeasurement, ReportSink, REPORT_COLUMNS};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Log a progress line every this many heights.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 2000;

/// Skipped heights kept in a [`RunSummary`]; later ones are only counted.
pub const MAX_RECORDED_SKIPS: usize = 100;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub start_height: u64,
    pub progress_interval: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            start_height: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// A height that produced no row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedHeight {
    pub height: u64,
    pub phase: FetchPhase,
    pub reason: String,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub start_height: u64,
    pub end_height: u64,
    pub rows_written: u64,
    /// Every height that produced no row
    pub skipped_count: u64,
    /// The first [`MAX_RECORDED_SKIPS`] of them
    pub skipped: Vec<SkippedHeight>,
    pub min_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
    pub total_latency: Duration,
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, latency: Duration) {
        self.rows_written += 1;
        self.total_latency += latency;
        self.min_latency = Some(self.min_latency.map_or(latency, |min| min.min(latency)));
        self.max_latency = Some(self.max_latency.map_or(latency, |max| max.max(latency)));
    }

    fn record_skip(&mut self, skip: SkippedHeight) {
        self.skipped_count += 1;
        if self.skipped.len() < MAX_RECORDED_SKIPS {
            self.skipped.push(skip);
        }
    }

    pub fn mean_latency(&self) -> Option<Duration> {
        if self.rows_written == 0 {
            return None;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.rows_written);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Heights visited, measured or not.
    pub fn heights_visited(&self) -> u64 {
        self.end_height - self.start_height
    }
}

pub struct BenchmarkDriver<'a> {
    reader: RecordReader<'a>,
    extractor: MetadataExtractor<'a>,
    config: DriverConfig,
}

impl<'a> BenchmarkDriver<'a> {
    pub fn new(ledger: &'a Ledger, config: DriverConfig) -> Result<Self, ProbeError> {
        if config.progress_interval == 0 {
            return Err(ProbeError::InvalidProgressInterval);
        }
        Ok(Self {
            reader: RecordReader::new(ledger),
            extractor: MetadataExtractor::new(ledger),
            config,
        })
    }

    /// Measure every height from the configured start up to `end_height`,
    /// the store height snapshot taken before the run. Blocks appended while
    /// the loop runs are not visited.
    pub fn run<S>(&self, end_height: u64, sink: &mut S) -> Result<RunSummary, ProbeError>
    where
        S: ReportSink + ?Sized,
    {
        let start_height = self.config.start_height;
        if start_height > end_height {
            return Err(ProbeError::StartHeightOutOfRange {
                start: start_height,
                current: end_height,
            });
        }

        sink.write_header(&REPORT_COLUMNS)?;

        let mut summary = RunSummary {
            start_height,
            end_height,
            ..RunSummary::default()
        };
        let started = Instant::now();

        for height in start_height..end_height {
            let progress = height % self.config.progress_interval == 0;
            if progress {
                info!("Analysing block {}/{}", height, end_height);
            }

            match self.measure(height) {
                Ok(row) => {
                    if progress {
                        info!(" - access time: {} ns.", row.access_time.as_nanos());
                    }
                    sink.write_row(&row)?;
                    summary.record(row.access_time);
                }
                Err(e) => {
                    warn!(height = e.height, phase = %e.phase, error = %e.source, "skipping block");
                    summary.record_skip(SkippedHeight {
                        height: e.height,
                        phase: e.phase,
                        reason: e.source.to_string(),
                    });
                }
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Produce the row for one height.
    pub fn measure(&self, height: u64) -> Result<AccessMeasurement, FetchError> {
        let hash = self.reader.resolve_hash(height)?;

        let start = Instant::now();
        let block = self.reader.fetch_by_hash(height, &hash)?;
        let access_time = start.elapsed();

        Ok(AccessMeasurement {
            height,
            timestamp: block.timestamp(),
            access_time,
            size: self.extractor.serialized_size(height)?,
            hash,
            tx_count: MetadataExtractor::transaction_count(&block),
            reward: MetadataExtractor::reward(&block),
            difficulty: self.extractor.difficulty(height)?,
        })
    }
}
