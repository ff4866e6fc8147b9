//! Read-only projections of a fetched block.
//!
//! Size and difficulty come from the store's side indexes, not from the
//! block body, so they cost one indexed read each and no re-encoding.

use crate::error::{FetchError, FetchPhase};
use crate::ledger::Ledger;
use ledgerprobe_types::Block;

#[derive(Clone, Copy)]
pub struct MetadataExtractor<'a> {
    ledger: &'a Ledger,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Serialized size in bytes, as recorded at commit time.
    pub fn serialized_size(&self, height: u64) -> Result<u64, FetchError> {
        self.ledger
            .get_block_size(height)
            .map_err(|e| FetchError::new(height, FetchPhase::SideIndex, e))
    }

    pub fn difficulty(&self, height: u64) -> Result<u128, FetchError> {
        self.ledger
            .get_block_difficulty(height)
            .map_err(|e| FetchError::new(height, FetchPhase::SideIndex, e))
    }

    /// Referenced transactions, not counting the issuance transaction.
    pub fn transaction_count(block: &Block) -> usize {
        block.tx_count()
    }

    /// Sum of the issuance transaction's output amounts.
    ///
    /// This is the declared minted total: fees are not subtracted and the
    /// amounts are not checked against any emission schedule.
    pub fn reward(block: &Block) -> u128 {
        block.miner_tx.total_output()
    }
}
