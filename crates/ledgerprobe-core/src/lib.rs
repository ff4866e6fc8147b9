//! ledgerprobe core - block access-time benchmarking.
//!
//! Opens a ledger store with relaxed durability, walks it by height, times
//! every block-body fetch and streams one report row per block. Per-block
//! failures are logged and skipped; only startup and report failures end a run.

pub mod driver;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod pool;
pub mod probe;
pub mod reader;
pub mod report;
pub mod store;

pub use driver::{BenchmarkDriver, DriverConfig, RunSummary, SkippedHeight, DEFAULT_PROGRESS_INTERVAL, MAX_RECORDED_SKIPS};
pub use error::{FetchError, FetchPhase, OpenError, ProbeError};
pub use ledger::Ledger;
pub use metadata::MetadataExtractor;
pub use pool::{PendingPool, PendingTx, PoolConfig, PoolError};
pub use probe::{run_probe, ProbeSettings};
pub use reader::RecordReader;
pub use report::{AccessMeasurement, CsvReportSink, ReportError, ReportSink, REPORT_COLUMNS};
pub use store::{StoreConfig, StoreHandle};
