//! cdrflow CLI
//!
//! Parallel CDR extraction and partitioning.

use clap::Parser;

mod args;
mod logging;
mod run;

use args::Cli;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Initialize logging (to stderr, so stdout is clean for output)
    logging::init_logging(args.log_level)?;

    let json = args.json;
    let summary = run::execute(args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    // Report results to stderr
    eprintln!();
    eprintln!("Extraction completed:");
    eprintln!("  Catalog files:     {}", summary.catalog_files);
    eprintln!("  Files processed:   {}", summary.files_processed);
    eprintln!("  Files skipped:     {}", summary.files_skipped);
    eprintln!("  Records kept:      {}", format_number(summary.records_kept));
    eprintln!(
        "  Records dropped:   {} stale, {} filtered, {} malformed",
        format_number(summary.records_stale),
        format_number(summary.records_filtered),
        format_number(summary.records_malformed)
    );
    eprintln!("  Batches written:   {}", summary.batches_written);
    eprintln!("  Bytes written:     {}", format_bytes(summary.bytes_written));
    eprintln!("  Duration:          {:.2}s", summary.elapsed_secs);

    if summary.elapsed_secs > 0.0 && summary.records_written > 0 {
        eprintln!(
            "  Throughput:        {} records/sec",
            format_number((summary.records_written as f64 / summary.elapsed_secs) as u64)
        );
    }

    for skipped in &summary.skipped_files {
        eprintln!("  Skipped: {} ({})", skipped.location, skipped.reason);
    }
    for cause in &summary.fatal_errors {
        eprintln!("  Fatal: {cause}");
    }

    if !summary.success() {
        std::process::exit(1);
    }
    if summary.files_skipped > 0 {
        std::process::exit(4); // Partial success
    }
    Ok(())
}

/// Format a large number with commas.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
