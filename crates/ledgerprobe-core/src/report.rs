//! Report rows and the sinks that receive them.

use ledgerprobe_types::{format_amount, format_timestamp, Hash};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Column names of the report, in order.
pub const REPORT_COLUMNS: [&str; 8] = [
    "Height",
    "Timestamp",
    "Access_time",
    "Size",
    "Hash",
    "No_tx",
    "Reward",
    "Difficulty",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("report already finished")]
    Finished,
}

/// One measured block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMeasurement {
    pub height: u64,
    /// Unix seconds from the block header
    pub timestamp: u64,
    /// Time spent loading the block body by hash
    pub access_time: Duration,
    pub size: u64,
    pub hash: Hash,
    pub tx_count: usize,
    /// Atomic units
    pub reward: u128,
    pub difficulty: u128,
}

impl AccessMeasurement {
    /// The row as rendered in the report, in [`REPORT_COLUMNS`] order.
    pub fn fields(&self) -> [String; 8] {
        [
            self.height.to_string(),
            format_timestamp(self.timestamp),
            self.access_time.as_nanos().to_string(),
            self.size.to_string(),
            self.hash.to_hex(),
            self.tx_count.to_string(),
            format_amount(self.reward),
            self.difficulty.to_string(),
        ]
    }
}

/// Receives the header once, then rows in height order.
pub trait ReportSink {
    fn write_header(&mut self, columns: &[&str]) -> Result<(), ReportError>;

    fn write_row(&mut self, row: &AccessMeasurement) -> Result<(), ReportError>;

    /// Flush and close. Calls after the first are no-ops.
    fn finish(&mut self) -> Result<(), ReportError>;
}

/// Comma-separated report writer.
pub struct CsvReportSink<W: Write> {
    writer: W,
    finished: bool,
}

impl CsvReportSink<BufWriter<File>> {
    /// Create (or truncate) the report file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record<I, S>(&mut self, fields: I) -> Result<(), ReportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.finished {
            return Err(ReportError::Finished);
        }
        let line = fields
            .into_iter()
            .map(|field| escape_field(field.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }
}

impl<W: Write> ReportSink for CsvReportSink<W> {
    fn write_header(&mut self, columns: &[&str]) -> Result<(), ReportError> {
        self.write_record(columns.iter().copied())
    }

    fn write_row(&mut self, row: &AccessMeasurement) -> Result<(), ReportError> {
        self.write_record(row.fields())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}

/// Quote a field if it contains a separator, a quote or a line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
