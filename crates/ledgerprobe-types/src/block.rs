use crate::hash::Hash;
use std::fmt;

/// A single output of the issuance transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct TxOut {
    /// Amount in atomic units
    pub amount: u64,
    /// One-time destination key
    pub target: [u8; 32],
}

impl TxOut {
    pub fn new(amount: u64, target: [u8; 32]) -> Self {
        Self { amount, target }
    }
}

/// The transaction that mints new coins in a block.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct IssuanceTx {
    pub version: u8,
    /// Height from which the outputs become spendable
    pub unlock_height: u64,
    pub outputs: Vec<TxOut>,
    pub extra: Vec<u8>,
}

impl IssuanceTx {
    pub fn new(unlock_height: u64, outputs: Vec<TxOut>) -> Self {
        Self {
            version: 1,
            unlock_height,
            outputs,
            extra: Vec::new(),
        }
    }

    /// Sum of the declared output amounts.
    ///
    /// Fees are not separated out and nothing is validated: this is the
    /// raw minted total as the transaction states it.
    pub fn total_output(&self) -> u128 {
        self.outputs.iter().map(|out| u128::from(out.amount)).sum()
    }

    pub fn hash(&self) -> Hash {
        let mut data = Vec::with_capacity(17 + self.outputs.len() * 40 + self.extra.len());
        data.push(self.version);
        data.extend_from_slice(&self.unlock_height.to_le_bytes());
        data.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for out in &self.outputs {
            data.extend_from_slice(&out.amount.to_le_bytes());
            data.extend_from_slice(&out.target);
        }
        data.extend_from_slice(&self.extra);
        Hash::compute(&data)
    }
}

/// Block header.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct BlockHeader {
    pub major_version: u8,
    pub minor_version: u8,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
    /// Hash of the previous block, zero for genesis
    pub prev_hash: Hash,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(prev_hash: Hash, timestamp: u64, nonce: u32) -> Self {
        Self {
            major_version: 1,
            minor_version: 0,
            timestamp,
            prev_hash,
            nonce,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_zero()
    }
}

/// A committed ledger record.
///
/// Non-issuance transactions are only referenced by hash; their bodies live
/// in the store's transaction table.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct Block {
    pub header: BlockHeader,
    pub miner_tx: IssuanceTx,
    pub tx_hashes: Vec<Hash>,
}

impl Block {
    pub fn new(header: BlockHeader, miner_tx: IssuanceTx, tx_hashes: Vec<Hash>) -> Self {
        Self {
            header,
            miner_tx,
            tx_hashes,
        }
    }

    /// Content hash: header fields, the issuance transaction hash and every
    /// referenced transaction hash, in order.
    pub fn hash(&self) -> Hash {
        let mut header = Vec::with_capacity(54);
        header.push(self.header.major_version);
        header.push(self.header.minor_version);
        header.extend_from_slice(&self.header.timestamp.to_le_bytes());
        header.extend_from_slice(self.header.prev_hash.as_bytes());
        header.extend_from_slice(&self.header.nonce.to_le_bytes());

        let miner_tx_hash = self.miner_tx.hash();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(2 + self.tx_hashes.len());
        parts.push(&header);
        parts.push(miner_tx_hash.as_bytes());
        parts.extend(self.tx_hashes.iter().map(|h| h.as_bytes().as_slice()));
        Hash::compute_multi(&parts)
    }

    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// Number of referenced (non-issuance) transactions.
    pub fn tx_count(&self) -> usize {
        self.tx_hashes.len()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {{ hash: {}, timestamp: {}, txs: {} }}",
            self.hash(),
            self.header.timestamp,
            self.tx_count()
        )
    }
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Timestamps chrono cannot represent fall back to the raw number.
pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
