//! Logging setup.
//!
//! Builds a `tracing` dispatcher from the logging config without installing
//! it globally; the caller runs its work inside [`LogContext::in_scope`].

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `ledgerprobe_core=debug`
    pub level: String,
    pub format: LogFormat,
    /// Write logs to this file instead of stdout
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

/// A configured subscriber plus the file writer guard that must outlive it.
pub struct LogContext {
    dispatch: Dispatch,
    _guard: Option<WorkerGuard>,
}

impl LogContext {
    pub fn new(config: &LoggingConfig) -> anyhow::Result<Self> {
        let filter = EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", config.level, e))?;

        let (writer, guard) = match &config.log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| anyhow::anyhow!("Failed to open log file '{}': {}", path.display(), e))?;
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            None => (BoxMakeWriter::new(std::io::stdout), None),
        };
        let ansi = config.log_file.is_none();

        let registry = tracing_subscriber::registry().with(filter);
        let dispatch = match config.format {
            LogFormat::Pretty => Dispatch::new(
                registry.with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer)),
            ),
            LogFormat::Json => Dispatch::new(registry.with(fmt::layer().json().with_writer(writer))),
            LogFormat::Compact => Dispatch::new(
                registry.with(fmt::layer().compact().with_ansi(ansi).with_writer(writer)),
            ),
        };

        Ok(Self {
            dispatch,
            _guard: guard,
        })
    }

    /// Run `f` with this context as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}
