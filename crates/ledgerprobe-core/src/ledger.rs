//! Ledger manager over the block database.

use crate::pool::PendingPool;
use ledgerprobe_storage::{BlockDB, StorageError};
use ledgerprobe_types::{Block, Hash};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// High-level view of a ledger store.
///
/// Built on its own, then bound to its [`PendingPool`] with
/// [`Ledger::bind_pool`] once both exist.
pub struct Ledger {
    blocks: BlockDB,
    pool: OnceCell<Arc<PendingPool>>,
    #[cfg(test)]
    fail_deinit: std::sync::atomic::AtomicBool,
}

impl Ledger {
    pub fn new(blocks: BlockDB) -> Self {
        Self {
            blocks,
            pool: OnceCell::new(),
            #[cfg(test)]
            fail_deinit: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Attach the pending pool. Returns the pool back if one is already bound.
    pub fn bind_pool(&self, pool: Arc<PendingPool>) -> Result<(), Arc<PendingPool>> {
        self.pool.set(pool)
    }

    pub fn pool(&self) -> Option<&Arc<PendingPool>> {
        self.pool.get()
    }

    pub fn blocks(&self) -> &BlockDB {
        &self.blocks
    }

    /// Number of committed blocks.
    pub fn current_height(&self) -> Result<u64, StorageError> {
        self.blocks.height()
    }

    pub fn get_block_id_by_height(&self, height: u64) -> Result<Hash, StorageError> {
        self.blocks.get_block_hash_by_height(height)
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, StorageError> {
        self.blocks.get_block_by_hash(hash)
    }

    /// Both lookups in one call; failures are logged and returned as `None`.
    pub fn get_block_by_height(&self, height: u64) -> Option<Block> {
        let hash = match self.get_block_id_by_height(height) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(height, error = %e, "cannot resolve block hash");
                return None;
            }
        };

        match self.get_block_by_hash(&hash) {
            Ok(block) => Some(block),
            Err(e) => {
                warn!(height, hash = %hash.to_hex(), error = %e, "block not found");
                None
            }
        }
    }

    pub fn get_block_size(&self, height: u64) -> Result<u64, StorageError> {
        self.blocks.get_block_size(height)
    }

    pub fn get_block_difficulty(&self, height: u64) -> Result<u128, StorageError> {
        self.blocks.get_block_difficulty(height)
    }

    /// Height of the block committing `tx_hash`, if any.
    pub fn get_tx_height(&self, tx_hash: &Hash) -> Result<Option<u64>, StorageError> {
        self.blocks.get_tx_height(tx_hash)
    }

    /// Release the ledger: report pool state and, unless the store is
    /// read-only, synchronize it to disk.
    pub fn deinit(&self) -> Result<(), StorageError> {
        if let Some(pool) = self.pool() {
            debug!(pending = pool.len(), "pending pool released");
        }

        #[cfg(test)]
        if self.fail_deinit.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Database("injected sync failure".to_string()));
        }

        let db = self.blocks.database();
        if db.is_read_only() {
            debug!("read-only store, skipping shutdown sync");
            return Ok(());
        }

        db.sync()?;
        info!(path = %db.path().display(), "ledger store synchronized");
        Ok(())
    }
}

#[cfg(test)]
impl Ledger {
    /// Make the next `deinit` fail as a broken sync would.
    pub(crate) fn fail_next_deinit(&self) {
        self.fail_deinit.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
