//! ledgerprobe - measure how long a ledger store takes to return each block.
//!
//! Walks the store from a start height to its current height, timing every
//! block-body fetch, and writes one CSV row per block.

mod config;
mod output;
mod paths;
mod telemetry;

use clap::Parser;
use config::ProbeConfig;
use ledgerprobe_core::run_probe;
use std::path::PathBuf;
use std::process::ExitCode;
use telemetry::{LogContext, LogFormat};
use tracing::error;

/// Command-line arguments. Unset flags fall back to the config file.
#[derive(Parser, Debug)]
#[command(name = "ledgerprobe")]
#[command(about = "Block access time benchmark for a ledger store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Path to the ledger store directory
    #[arg(short = 'b', long = "bc-path", value_name = "DIR")]
    bc_path: Option<PathBuf>,

    /// Height to start measuring from
    #[arg(short = 't', long, value_name = "N")]
    start_height: Option<u64>,

    /// Report file
    #[arg(short = 'c', long = "out-csv-file", value_name = "FILE")]
    out_csv_file: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "ledgerprobe_core=debug"
    #[arg(short, long, env = "LEDGERPROBE_LOG")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Heights between progress lines
    #[arg(long, value_name = "N")]
    progress_interval: Option<u64>,

    /// Open the store read-only
    #[arg(long)]
    read_only: bool,
}

impl Args {
    fn apply(&self, config: &mut ProbeConfig) {
        if let Some(start_height) = self.start_height {
            config.start_height = start_height;
        }
        if let Some(output) = &self.out_csv_file {
            config.output = output.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if self.read_only {
            config.storage.read_only = true;
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::from_file(path)?,
        None => ProbeConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let log = LogContext::new(&config.logging)?;
    let settings = config.to_settings(args.bc_path.as_deref());

    output::print_banner(&settings);

    let summary = log.in_scope(|| {
        run_probe(&settings).map_err(|e| {
            error!(error = %e, "probe failed");
            e
        })
    })?;

    output::print_summary(&summary, &settings.output);
    Ok(())
}
