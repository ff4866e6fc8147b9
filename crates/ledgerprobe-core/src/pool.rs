//! Pending-record pool.
//!
//! Holds transactions that are not yet committed. It keeps a weak link back
//! to its [`Ledger`] so it can refuse transactions the chain already has.

use crate::ledger::Ledger;
use ledgerprobe_storage::StorageError;
use ledgerprobe_types::Hash;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_size: 5000 }
    }
}

/// Transaction pool error
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Transaction pool is full")]
    PoolFull,

    #[error("Transaction {} already pending", .0.to_hex())]
    Duplicate(Hash),

    #[error("Transaction {} already committed at height {height}", .hash.to_hex())]
    AlreadyCommitted { hash: Hash, height: u64 },

    #[error("Pool is not bound to a live ledger")]
    Unbound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A transaction waiting for inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub hash: Hash,
    pub blob_size: usize,
    pub fee: u64,
}

/// Pool of pending transactions.
pub struct PendingPool {
    config: PoolConfig,
    txs: RwLock<HashMap<Hash, PendingTx>>,
    ledger: OnceCell<Weak<Ledger>>,
}

impl PendingPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            txs: RwLock::new(HashMap::new()),
            ledger: OnceCell::new(),
        }
    }

    /// Attach the owning ledger. Returns the link back if one is already bound.
    pub fn bind_ledger(&self, ledger: Weak<Ledger>) -> Result<(), Weak<Ledger>> {
        self.ledger.set(ledger)
    }

    fn ledger(&self) -> Result<Arc<Ledger>, PoolError> {
        self.ledger
            .get()
            .and_then(Weak::upgrade)
            .ok_or(PoolError::Unbound)
    }

    /// Add a transaction, refusing duplicates and anything already on chain.
    pub fn add_tx(&self, tx: PendingTx) -> Result<(), PoolError> {
        let ledger = self.ledger()?;
        if let Some(height) = ledger.get_tx_height(&tx.hash)? {
            return Err(PoolError::AlreadyCommitted { hash: tx.hash, height });
        }

        let mut txs = self.txs.write();
        if txs.contains_key(&tx.hash) {
            return Err(PoolError::Duplicate(tx.hash));
        }
        if txs.len() >= self.config.max_size {
            return Err(PoolError::PoolFull);
        }
        txs.insert(tx.hash, tx);
        Ok(())
    }

    pub fn remove_tx(&self, hash: &Hash) -> Option<PendingTx> {
        self.txs.write().remove(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.txs.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.txs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.read().is_empty()
    }
}
