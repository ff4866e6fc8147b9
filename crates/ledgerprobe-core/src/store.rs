//! Store handle: owns the database, the ledger manager and the pending pool
//! for the duration of a run.

use crate::error::OpenError;
use crate::ledger::Ledger;
use crate::pool::{PendingPool, PoolConfig};
use ledgerprobe_storage::{BlockDB, Database, DatabaseConfig, DurabilityMode, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Options used when opening a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub durability: DurabilityMode,
    pub read_only: bool,
    pub cache_size_mb: usize,
    pub max_open_files: i32,
    pub pool: PoolConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            durability: DurabilityMode::Relaxed,
            read_only: false,
            cache_size_mb: db.cache_size_mb,
            max_open_files: db.max_open_files,
            pool: PoolConfig::default(),
        }
    }
}

impl StoreConfig {
    fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            cache_size_mb: self.cache_size_mb,
            max_open_files: self.max_open_files,
            durability: self.durability,
            read_only: self.read_only,
            create_if_missing: false,
            read_only_if_locked: true,
            ..DatabaseConfig::default()
        }
    }
}

/// An open ledger store.
///
/// Released exactly once, by [`StoreHandle::close`] or on drop.
pub struct StoreHandle {
    path: PathBuf,
    config: StoreConfig,
    ledger: Option<Arc<Ledger>>,
}

impl StoreHandle {
    /// Open the store at `path`.
    ///
    /// `path` must be an existing, non-empty directory holding store files.
    pub fn open(path: &Path, config: StoreConfig) -> Result<Self, OpenError> {
        if !is_populated_dir(path) {
            return Err(OpenError::NotFound(path.to_path_buf()));
        }

        let corrupt = |source: StorageError| OpenError::Corrupt {
            path: path.to_path_buf(),
            source,
        };

        let db = Database::open(path, &config.database_config()).map_err(corrupt)?;
        let read_only = db.is_read_only();
        let blocks = BlockDB::open(Arc::new(db)).map_err(corrupt)?;

        // Both halves are built independently, then bound to each other.
        let ledger = Arc::new(Ledger::new(blocks));
        let pool = Arc::new(PendingPool::new(config.pool.clone()));
        ledger
            .bind_pool(pool.clone())
            .map_err(|_| OpenError::Wiring("pending pool"))?;
        pool.bind_ledger(Arc::downgrade(&ledger))
            .map_err(|_| OpenError::Wiring("ledger"))?;

        info!(
            path = %path.display(),
            durability = ?config.durability,
            read_only,
            "ledger store opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            config,
            ledger: Some(ledger),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.ledger.is_some()
    }

    pub fn ledger(&self) -> Result<&Ledger, StorageError> {
        self.ledger.as_deref().ok_or(StorageError::Closed)
    }

    pub fn pool(&self) -> Result<&Arc<PendingPool>, StorageError> {
        self.ledger()?.pool().ok_or(StorageError::Closed)
    }

    /// Number of committed blocks; the exclusive upper bound for heights.
    pub fn current_height(&self) -> Result<u64, StorageError> {
        self.ledger()?.current_height()
    }

    /// Release the store, synchronizing it first unless it is read-only.
    ///
    /// Calling this again after the first call does nothing. The handle is
    /// released even when the synchronization fails.
    pub fn close(&mut self) -> Result<(), StorageError> {
        let Some(ledger) = self.ledger.take() else {
            return Ok(());
        };
        let result = ledger.deinit();
        drop(ledger);
        info!(path = %self.path.display(), "ledger store closed");
        result
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "store synchronization failed on release");
        }
    }
}

fn is_populated_dir(path: &Path) -> bool {
    path.is_dir()
        && std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
}
