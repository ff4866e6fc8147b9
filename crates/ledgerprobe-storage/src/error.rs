use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid column family: {0}")]
    InvalidColumnFamily(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Height {height} out of range (store height {current})")]
    HeightOutOfRange { height: u64, current: u64 },

    #[error("No {index} entry for height {height}")]
    MissingIndexEntry { index: &'static str, height: u64 },

    #[error("Store schema marker missing")]
    MissingSchema,

    #[error("Unsupported store schema: expected {expected}, found {found}")]
    UnsupportedSchema { expected: u32, found: u32 },

    #[error("Store is open read-only")]
    ReadOnly,

    #[error("Store is closed")]
    Closed,

    #[error("Invalid database config: {0}")]
    InvalidConfig(String),
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<borsh::io::Error> for StorageError {
    fn from(e: borsh::io::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<ledgerprobe_types::TypesError> for StorageError {
    fn from(e: ledgerprobe_types::TypesError) -> Self {
        StorageError::Deserialization(e.to_string())
    }
}
