//! Block database: bodies, the height index and the side indexes the probe reads.

use crate::db::{ColumnFamily, Database};
use crate::error::StorageError;
use ledgerprobe_types::{Block, Hash};
use std::sync::Arc;

/// Store layout version written at creation.
pub const SCHEMA_VERSION: u32 = 1;

const META_SCHEMA_VERSION: &[u8] = b"schema_version";
const META_HEIGHT: &[u8] = b"height";

/// Encode a height as big-endian bytes for ordered iteration.
fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

fn decode_u64(data: &[u8], what: &str) -> Result<u64, StorageError> {
    let bytes: [u8; 8] = data
        .try_into()
        .map_err(|_| StorageError::Deserialization(format!("invalid {} length: {}", what, data.len())))?;
    Ok(u64::from_le_bytes(bytes))
}

fn decode_u128(data: &[u8], what: &str) -> Result<u128, StorageError> {
    let bytes: [u8; 16] = data
        .try_into()
        .map_err(|_| StorageError::Deserialization(format!("invalid {} length: {}", what, data.len())))?;
    Ok(u128::from_le_bytes(bytes))
}

/// Block storage with indexing.
pub struct BlockDB {
    db: Arc<Database>,
}

impl BlockDB {
    /// Attach to an existing store, checking its schema marker.
    pub fn open(db: Arc<Database>) -> Result<Self, StorageError> {
        let block_db = Self { db };
        match block_db.schema_version()? {
            None => Err(StorageError::MissingSchema),
            Some(SCHEMA_VERSION) => Ok(block_db),
            Some(found) => Err(StorageError::UnsupportedSchema {
                expected: SCHEMA_VERSION,
                found,
            }),
        }
    }

    /// Prepare a fresh store, writing the schema marker if absent.
    pub fn initialize(db: Arc<Database>) -> Result<Self, StorageError> {
        let block_db = Self { db };
        if block_db.schema_version()?.is_none() {
            block_db.db.put(
                ColumnFamily::Metadata,
                META_SCHEMA_VERSION,
                &SCHEMA_VERSION.to_le_bytes(),
            )?;
        }
        Self::open(block_db.db)
    }

    /// The underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn schema_version(&self) -> Result<Option<u32>, StorageError> {
        match self.db.get(ColumnFamily::Metadata, META_SCHEMA_VERSION)? {
            Some(data) => {
                let bytes: [u8; 4] = data.as_slice().try_into().map_err(|_| {
                    StorageError::Deserialization(format!("invalid schema marker length: {}", data.len()))
                })?;
                Ok(Some(u32::from_le_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    /// Number of committed blocks; valid heights are `0..height()`.
    pub fn height(&self) -> Result<u64, StorageError> {
        match self.db.get(ColumnFamily::Metadata, META_HEIGHT)? {
            Some(data) => decode_u64(&data, "height"),
            None => Ok(0),
        }
    }

    /// Append a block at the next height.
    ///
    /// Body, height index, size, difficulty, transaction index and the new
    /// height are committed in one batch.
    pub fn append_block(&self, block: &Block, difficulty: u128) -> Result<u64, StorageError> {
        let height = self.height()?;
        let hash = block.hash();
        let body = borsh::to_vec(block)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let key = height_key(height);

        let mut batch = self.db.new_write_batch();
        batch.put(ColumnFamily::Blocks, hash.as_bytes(), &body)?;
        batch.put(ColumnFamily::BlockIndex, &key, hash.as_bytes())?;
        batch.put(ColumnFamily::BlockSizes, &key, &(body.len() as u64).to_le_bytes())?;
        batch.put(ColumnFamily::Difficulties, &key, &difficulty.to_le_bytes())?;
        for tx_hash in &block.tx_hashes {
            batch.put(ColumnFamily::TxIndex, tx_hash.as_bytes(), &height.to_le_bytes())?;
        }
        batch.put(ColumnFamily::Metadata, META_HEIGHT, &(height + 1).to_le_bytes())?;
        self.db.batch_write(batch)?;

        tracing::debug!(height, hash = %hash.to_hex(), size = body.len(), "block appended");
        Ok(height)
    }

    /// Resolve a height to its block hash.
    pub fn get_block_hash_by_height(&self, height: u64) -> Result<Hash, StorageError> {
        let current = self.height()?;
        if height >= current {
            return Err(StorageError::HeightOutOfRange { height, current });
        }

        match self.db.get(ColumnFamily::BlockIndex, &height_key(height))? {
            Some(data) => Ok(Hash::from_slice(&data)?),
            None => Err(StorageError::MissingIndexEntry {
                index: ColumnFamily::BlockIndex.name(),
                height,
            }),
        }
    }

    /// Get a block body by hash.
    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, StorageError> {
        let data = self
            .db
            .get(ColumnFamily::Blocks, hash.as_bytes())?
            .ok_or_else(|| StorageError::BlockNotFound(hash.to_hex()))?;

        borsh::from_slice(&data).map_err(|e| {
            StorageError::Deserialization(format!("block {}: {}", hash.to_hex(), e))
        })
    }

    /// Get a block by height (both lookups).
    pub fn get_block_by_height(&self, height: u64) -> Result<Block, StorageError> {
        let hash = self.get_block_hash_by_height(height)?;
        self.get_block_by_hash(&hash)
    }

    /// Serialized size of the block at `height`, as recorded when it was committed.
    pub fn get_block_size(&self, height: u64) -> Result<u64, StorageError> {
        match self.db.get(ColumnFamily::BlockSizes, &height_key(height))? {
            Some(data) => decode_u64(&data, "block size"),
            None => Err(StorageError::MissingIndexEntry {
                index: ColumnFamily::BlockSizes.name(),
                height,
            }),
        }
    }

    /// Difficulty of the block at `height`.
    pub fn get_block_difficulty(&self, height: u64) -> Result<u128, StorageError> {
        match self.db.get(ColumnFamily::Difficulties, &height_key(height))? {
            Some(data) => decode_u128(&data, "difficulty"),
            None => Err(StorageError::MissingIndexEntry {
                index: ColumnFamily::Difficulties.name(),
                height,
            }),
        }
    }

    /// Height of the block that includes the given transaction.
    pub fn get_tx_height(&self, tx_hash: &Hash) -> Result<Option<u64>, StorageError> {
        match self.db.get(ColumnFamily::TxIndex, tx_hash.as_bytes())? {
            Some(data) => Ok(Some(decode_u64(&data, "tx height")?)),
            None => Ok(None),
        }
    }

    /// Check if a transaction is committed.
    pub fn has_tx(&self, tx_hash: &Hash) -> Result<bool, StorageError> {
        Ok(self.db.get(ColumnFamily::TxIndex, tx_hash.as_bytes())?.is_some())
    }
}
