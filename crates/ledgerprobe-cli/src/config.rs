//! Probe configuration.
//!
//! Loaded from an optional TOML file; command-line flags override it.

use crate::paths::resolve_store_path;
use crate::telemetry::LoggingConfig;
use ledgerprobe_core::{ProbeError, ProbeSettings, StoreConfig, DEFAULT_PROGRESS_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "/tmp/block_access_time.csv";

/// Upper bound for `storage.cache_size_mb` (1 TiB).
pub const MAX_CACHE_SIZE_MB: usize = 1 << 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Ledger store directory; the home-directory default when unset
    pub store_path: Option<PathBuf>,
    /// Report file
    pub output: PathBuf,
    pub start_height: u64,
    /// Heights between progress lines
    pub progress_interval: u64,
    pub storage: StorageSettings,
    pub logging: LoggingConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            start_height: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            storage: StorageSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Database tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Block cache size (MB)
    pub cache_size_mb: usize,
    pub max_open_files: i32,
    /// Open without taking the write lock; skips the shutdown sync
    pub read_only: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            cache_size_mb: store.cache_size_mb,
            max_open_files: store.max_open_files,
            read_only: store.read_only,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from file.
    /// Paths containing `..` are refused.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if path.to_string_lossy().contains("..") {
            anyhow::bail!("Invalid path: directory traversal detected");
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: ProbeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.progress_interval == 0 {
            return Err(ProbeError::Config("progress_interval must be greater than zero".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ProbeError::Config("output path is empty".to_string()));
        }
        if self.storage.cache_size_mb == 0 || self.storage.cache_size_mb > MAX_CACHE_SIZE_MB {
            return Err(ProbeError::Config(format!(
                "storage.cache_size_mb must be between 1 and {}",
                MAX_CACHE_SIZE_MB
            )));
        }
        Ok(())
    }

    /// Settings for one run. `cli_store_path` wins over the configured path.
    pub fn to_settings(&self, cli_store_path: Option<&Path>) -> ProbeSettings {
        let store_path = resolve_store_path(cli_store_path, self.store_path.as_deref());
        ProbeSettings {
            start_height: self.start_height,
            progress_interval: self.progress_interval,
            store: StoreConfig {
                read_only: self.storage.read_only,
                cache_size_mb: self.storage.cache_size_mb,
                max_open_files: self.storage.max_open_files,
                ..StoreConfig::default()
            },
            ..ProbeSettings::new(store_path, &self.output)
        }
    }
}
