//! Error taxonomy of a probe run.
//!
//! [`ProbeError`] is fatal and ends the run before or instead of the loop.
//! [`FetchError`] belongs to a single height: the driver logs it and moves on.

use crate::report::ReportError;
use ledgerprobe_storage::StorageError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open a ledger store.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("store path {} does not exist, is not a directory or is empty", .0.display())]
    NotFound(PathBuf),

    #[error("store at {} is corrupt or unreadable: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("store wiring failed: {0} already bound")]
    Wiring(&'static str),
}

/// Which lookup of a per-height read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// height → hash through the height index
    ResolveHash,
    /// hash → block body
    LoadBody,
    /// size or difficulty side index
    SideIndex,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::ResolveHash => write!(f, "hash resolution"),
            FetchPhase::LoadBody => write!(f, "body fetch"),
            FetchPhase::SideIndex => write!(f, "side index lookup"),
        }
    }
}

/// A read of one height failed.
#[derive(Debug, Error)]
#[error("block {height}: {phase} failed: {source}")]
pub struct FetchError {
    pub height: u64,
    pub phase: FetchPhase,
    #[source]
    pub source: StorageError,
}

impl FetchError {
    pub fn new(height: u64, phase: FetchPhase, source: StorageError) -> Self {
        Self {
            height,
            phase,
            source,
        }
    }
}

/// Fatal errors of a probe run. Any of these maps to exit code 1.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("store path {} is not a directory", .0.display())]
    InvalidStorePath(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error("given start height {start} is greater than blockchain height {current}")]
    StartHeightOutOfRange { start: u64, current: u64 },

    #[error("cannot open report file {}: {source}", .path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A header or row could not be written. Unlike a per-height read
    /// failure this ends the run: the report would otherwise be silently
    /// incomplete. The sink is still finished and the store still closed.
    #[error("report write failed: {0}")]
    SinkWrite(#[from] ReportError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("progress interval must be greater than zero")]
    InvalidProgressInterval,
}
