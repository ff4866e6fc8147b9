//! ledgerprobe storage - the embedded ledger store.
//!
//! A RocksDB database with one column family per table (block bodies, the
//! height index and the size/difficulty/transaction side indexes), plus the
//! [`BlockDB`] view that reads and appends blocks.

pub mod block_db;
pub mod db;
pub mod error;

pub use block_db::{BlockDB, SCHEMA_VERSION};
pub use db::{ColumnFamily, Compression, Database, DatabaseConfig, DurabilityMode, WriteBatch};
pub use error::StorageError;
