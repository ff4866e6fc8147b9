//! A complete run: open the store, check the start height, open the report,
//! drive the loop, then finish the report and release the store.

use crate::driver::{BenchmarkDriver, DriverConfig, RunSummary, DEFAULT_PROGRESS_INTERVAL};
use crate::error::ProbeError;
use crate::report::{CsvReportSink, ReportSink};
use crate::store::{StoreConfig, StoreHandle};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub store_path: PathBuf,
    pub output: PathBuf,
    pub start_height: u64,
    pub progress_interval: u64,
    pub store: StoreConfig,
}

impl ProbeSettings {
    pub fn new(store_path: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            output: output.into(),
            start_height: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            store: StoreConfig::default(),
        }
    }

    /// Check what can be checked before touching the store.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if !self.store_path.is_dir() {
            return Err(ProbeError::InvalidStorePath(self.store_path.clone()));
        }
        if self.progress_interval == 0 {
            return Err(ProbeError::InvalidProgressInterval);
        }
        Ok(())
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            start_height: self.start_height,
            progress_interval: self.progress_interval,
        }
    }
}

/// Run the probe, writing the report to `settings.output`.
///
/// No report file is created when the store cannot be opened or the start
/// height lies beyond the store.
pub fn run_probe(settings: &ProbeSettings) -> Result<RunSummary, ProbeError> {
    settings.validate()?;
    let store = StoreHandle::open(&settings.store_path, settings.store.clone())?;
    run_on_store(store, settings)
}

/// Run against an already open store, then release it. A failed release is
/// logged and does not change the outcome.
fn run_on_store(mut store: StoreHandle, settings: &ProbeSettings) -> Result<RunSummary, ProbeError> {
    info!("Blockchain path: {}", store.path().display());

    let result = open_report_and_run(&store, settings);

    if let Err(e) = store.close() {
        warn!(error = %e, "store synchronization failed on shutdown");
    }
    result
}

fn open_report_and_run(store: &StoreHandle, settings: &ProbeSettings) -> Result<RunSummary, ProbeError> {
    let current = store.current_height()?;
    if settings.start_height > current {
        return Err(ProbeError::StartHeightOutOfRange {
            start: settings.start_height,
            current,
        });
    }
    info!("Current blockchain height: {}", current);

    let driver = BenchmarkDriver::new(store.ledger()?, settings.driver_config())?;

    let mut sink = CsvReportSink::create(&settings.output).map_err(|source| ProbeError::SinkOpen {
        path: settings.output.clone(),
        source,
    })?;
    info!("Csv file: {} opened for writing results.", settings.output.display());

    let result = driver.run(current, &mut sink);
    let finished = sink.finish();

    match (result, finished) {
        (Ok(summary), Ok(())) => {
            info!("Csv saved as: {}", settings.output.display());
            Ok(summary)
        }
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), finished) => {
            if let Err(flush) = finished {
                error!(error = %flush, "report flush failed after aborted run");
            }
            Err(e)
        }
    }
}
