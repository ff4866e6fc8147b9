//! Console output for the probe binary.

use colored::Colorize;
use ledgerprobe_core::{ProbeSettings, RunSummary};
use std::path::Path;
use std::time::Duration;

pub fn print_banner(settings: &ProbeSettings) {
    println!();
    println!("{}", "ledgerprobe - block access time".bold().cyan());
    println!("  {:<14} {}", "Store:", settings.store_path.display());
    println!("  {:<14} {}", "Start height:", settings.start_height);
    println!("  {:<14} {}", "Report:", settings.output.display());
    if settings.store.read_only {
        println!("  {}", "read-only mode, no sync on shutdown".yellow());
    }
    println!();
}

pub fn print_summary(summary: &RunSummary, output: &Path) {
    println!();
    println!("{}", "Run complete".bold().green());
    println!("  {:<14} {}", "Heights:", format!("{}..{}", summary.start_height, summary.end_height));
    println!("  {:<14} {}", "Rows written:", summary.rows_written);

    let skipped = summary.skipped_count.to_string();
    if summary.skipped_count == 0 {
        println!("  {:<14} {}", "Skipped:", skipped);
    } else {
        println!("  {:<14} {}", "Skipped:", skipped.yellow());
        for skip in summary.skipped.iter().take(10) {
            println!("    {} {} ({})", skip.height, skip.phase, skip.reason.dimmed());
        }
        let shown = summary.skipped.len().min(10) as u64;
        if summary.skipped_count > shown {
            println!("    ... and {} more", summary.skipped_count - shown);
        }
    }

    println!("  {:<14} {}", "Min access:", format_latency(summary.min_latency));
    println!("  {:<14} {}", "Mean access:", format_latency(summary.mean_latency()));
    println!("  {:<14} {}", "Max access:", format_latency(summary.max_latency));
    println!("  {:<14} {:.2?}", "Elapsed:", summary.elapsed);
    println!("  {:<14} {}", "Report:", output.display());
}

pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

fn format_latency(latency: Option<Duration>) -> String {
    match latency {
        Some(d) => format!("{} ns", d.as_nanos()),
        None => "-".to_string(),
    }
}
