use crate::error::StorageError;
use rocksdb::{ColumnFamilyDescriptor, Options, WriteOptions, DB};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Column families of a ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFamily {
    /// Block bodies: block_hash → borsh(Block)
    Blocks,
    /// Height index: height (BE) → block_hash
    BlockIndex,
    /// Serialized block sizes: height (BE) → u64 LE
    BlockSizes,
    /// Block difficulties: height (BE) → u128 LE
    Difficulties,
    /// Transaction index: tx_hash → height (u64 LE)
    TxIndex,
    /// Metadata: key → value (schema version, height)
    Metadata,
}

impl ColumnFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::Blocks => "blocks",
            ColumnFamily::BlockIndex => "block_index",
            ColumnFamily::BlockSizes => "block_sizes",
            ColumnFamily::Difficulties => "difficulties",
            ColumnFamily::TxIndex => "tx_index",
            ColumnFamily::Metadata => "metadata",
        }
    }

    pub fn all() -> [ColumnFamily; 6] {
        [
            ColumnFamily::Blocks,
            ColumnFamily::BlockIndex,
            ColumnFamily::BlockSizes,
            ColumnFamily::Difficulties,
            ColumnFamily::TxIndex,
            ColumnFamily::Metadata,
        ]
    }
}

/// How hard the store works to make each commit crash-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync on every commit
    Durable,
    /// Skip the per-commit sync; a crash may lose the most recent commits
    #[default]
    Relaxed,
}

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Cache size in MB
    pub cache_size_mb: usize,
    /// Max open files
    pub max_open_files: i32,
    /// Compression type
    pub compression: Compression,
    /// Commit durability
    pub durability: DurabilityMode,
    /// Open without the write lock; writes and the shutdown sync are refused
    pub read_only: bool,
    /// Create the directory and column families when absent
    pub create_if_missing: bool,
    /// When another writer holds the store lock, open read-only instead of failing
    pub read_only_if_locked: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            cache_size_mb: 128,
            max_open_files: 512,
            compression: Compression::Lz4,
            durability: DurabilityMode::Relaxed,
            read_only: false,
            create_if_missing: false,
            read_only_if_locked: false,
        }
    }
}

/// Compression type for database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Snappy,
    Lz4,
    Zstd,
}

impl Compression {
    fn to_rocksdb(self) -> rocksdb::DBCompressionType {
        match self {
            Compression::None => rocksdb::DBCompressionType::None,
            Compression::Snappy => rocksdb::DBCompressionType::Snappy,
            Compression::Lz4 => rocksdb::DBCompressionType::Lz4,
            Compression::Zstd => rocksdb::DBCompressionType::Zstd,
        }
    }
}

/// RocksDB wrapper with column family support.
pub struct Database {
    db: Arc<DB>,
    path: PathBuf,
    durability: DurabilityMode,
    read_only: bool,
}

impl Database {
    /// Open a database at the given path.
    ///
    /// With `read_only_if_locked`, a store whose lock is held by a live writer
    /// is opened read-only; [`Database::is_read_only`] reports which mode won.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self, StorageError> {
        let cache_bytes = config
            .cache_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                StorageError::InvalidConfig(format!("cache size of {} MB is too large", config.cache_size_mb))
            })?;

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(config.create_if_missing);
        opts.set_max_open_files(config.max_open_files);

        let cache = rocksdb::Cache::new_lru_cache(cache_bytes);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_block_cache(&cache);
        opts.set_block_based_table_factory(&block_opts);
        opts.set_compression_type(config.compression.to_rocksdb());

        let names = ColumnFamily::all().map(|cf| cf.name());
        let (db, read_only) = if config.read_only {
            (DB::open_cf_for_read_only(&opts, path, names, false)?, true)
        } else {
            let cf_descriptors: Vec<ColumnFamilyDescriptor> = ColumnFamily::all()
                .into_iter()
                .map(|cf| {
                    let mut cf_opts = Options::default();
                    cf_opts.set_compression_type(config.compression.to_rocksdb());
                    ColumnFamilyDescriptor::new(cf.name(), cf_opts)
                })
                .collect();
            match DB::open_cf_descriptors(&opts, path, cf_descriptors) {
                Ok(db) => (db, false),
                Err(e) if config.read_only_if_locked && is_lock_error(&e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "store is locked by another writer, opening read-only"
                    );
                    (DB::open_cf_for_read_only(&opts, path, names, false)?, true)
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::debug!(
            path = %path.display(),
            durability = ?config.durability,
            read_only,
            "rocksdb opened"
        );

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
            durability: config.durability,
            read_only,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn cf_handle(&self, cf: ColumnFamily) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(cf.name())
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.name().to_string()))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.durability == DurabilityMode::Durable);
        opts
    }

    /// Get a value from the database.
    pub fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf_handle = self.cf_handle(cf)?;
        let result = self.db.get_cf(&cf_handle, key)?;
        Ok(result)
    }

    /// Put a value into the database.
    pub fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        let cf_handle = self.cf_handle(cf)?;
        self.db.put_cf_opt(&cf_handle, key, value, &self.write_options())?;
        Ok(())
    }

    /// Delete a value from the database.
    pub fn delete(&self, cf: ColumnFamily, key: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        let cf_handle = self.cf_handle(cf)?;
        self.db.delete_cf_opt(&cf_handle, key, &self.write_options())?;
        Ok(())
    }

    /// Create a new write batch.
    pub fn new_write_batch(&self) -> WriteBatch {
        WriteBatch::new(self.db.clone())
    }

    /// Commit a batch atomically, honouring the durability mode.
    pub fn batch_write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.db.write_opt(batch.inner, &self.write_options())?;
        Ok(())
    }

    /// Flush memtables of every column family and sync the WAL.
    ///
    /// This is the shutdown synchronization; in relaxed mode it is the only
    /// point where recent commits become durable.
    pub fn sync(&self) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.db.flush_wal(true)?;
        for cf in ColumnFamily::all() {
            let cf_handle = self.cf_handle(cf)?;
            self.db.flush_cf(&cf_handle)?;
        }
        Ok(())
    }
}

/// RocksDB's messages for a `LOCK` file held by another process or by
/// another handle in this one.
fn is_lock_error(e: &rocksdb::Error) -> bool {
    let msg = e.to_string();
    msg.contains("While lock file") || msg.contains("lock hold by current process")
}

/// Write batch for atomic operations.
pub struct WriteBatch {
    inner: rocksdb::WriteBatch,
    db: Arc<DB>,
}

impl WriteBatch {
    fn new(db: Arc<DB>) -> Self {
        Self {
            inner: rocksdb::WriteBatch::default(),
            db,
        }
    }

    /// Put a value into the batch.
    pub fn put(&mut self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf_handle = self.db.cf_handle(cf.name())
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.name().to_string()))?;

        self.inner.put_cf(&cf_handle, key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
