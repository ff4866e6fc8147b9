//! Two-phase record lookup: height → hash → block.

use crate::error::{FetchError, FetchPhase};
use crate::ledger::Ledger;
use ledgerprobe_types::{Block, Hash};

/// Reads blocks from a ledger by height.
#[derive(Clone, Copy)]
pub struct RecordReader<'a> {
    ledger: &'a Ledger,
}

impl<'a> RecordReader<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Phase one: resolve the height through the height index.
    pub fn resolve_hash(&self, height: u64) -> Result<Hash, FetchError> {
        self.ledger
            .get_block_id_by_height(height)
            .map_err(|e| FetchError::new(height, FetchPhase::ResolveHash, e))
    }

    /// Phase two: load the body stored under `hash`. `height` only labels errors.
    pub fn fetch_by_hash(&self, height: u64, hash: &Hash) -> Result<Block, FetchError> {
        self.ledger
            .get_block_by_hash(hash)
            .map_err(|e| FetchError::new(height, FetchPhase::LoadBody, e))
    }

    /// Both phases.
    pub fn fetch_by_height(&self, height: u64) -> Result<Block, FetchError> {
        let hash = self.resolve_hash(height)?;
        self.fetch_by_hash(height, &hash)
    }
}
