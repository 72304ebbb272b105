//! CLI argument definitions for cdrflow.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

pub use crate::logging::LogLevel;

/// Parallel CDR extraction and partitioning.
///
/// Reads one day of vendor CDR files from a date-partitioned source tree,
/// filters and classifies the records, and writes partitioned gzip CSV
/// batches under the destination.
///
/// ## Examples
///
/// Extract one day with defaults:
///   cdrflow /data/raw --date 2019-06-15
///
/// Foreigners only, voice and data types, two-stage with 2 writers:
///   cdrflow /data/raw --date 2019-06-15 -f -t voice -t data -w 2
#[derive(Parser, Debug)]
#[command(name = "cdrflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the date-partitioned source tree
    /// (<YYYY>/<MM>/<DD>[/<type>]/...)
    pub source: PathBuf,

    /// Day to extract
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: NaiveDate,

    /// Directory the output tree is written under
    #[arg(short = 'd', long, env = "CDRFLOW_DEST", default_value = ".")]
    pub dest: PathBuf,

    /// CDR type subdirectories to read under the date partition
    /// (repeatable; omit to read the date directory itself)
    #[arg(short = 't', long = "cdr-type", value_name = "TYPE")]
    pub cdr_types: Vec<String>,

    // === Processing ===
    /// Number of extraction workers (must be >= 1)
    #[arg(short = 'n', long, env = "CDRFLOW_WORKERS", default_value_t = num_cpus(), value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Number of writer workers; 0 makes extraction workers write their
    /// own batches
    #[arg(short = 'w', long, env = "CDRFLOW_WRITERS", default_value = "0")]
    pub writers: usize,

    /// Nominal records per output file (must be >= 1)
    #[arg(short = 's', long, env = "CDRFLOW_SECTION_SIZE", default_value_t = cdrflow_types::DEFAULT_SECTION_SIZE, value_parser = parse_positive_usize)]
    pub section_size: usize,

    /// Per-worker rotation jitter as a fraction of the section size
    /// (0.0 disables jitter)
    #[arg(long, default_value_t = cdrflow_types::DEFAULT_SPREAD, value_parser = parse_spread)]
    pub spread: f64,

    /// Transfer queue capacity in batches (two-stage mode, must be >= 1)
    #[arg(long, default_value_t = cdrflow_types::DEFAULT_TRANSFER_CAPACITY, value_parser = parse_positive_usize)]
    pub capacity: usize,

    // === Filtering ===
    /// Keep only foreign-subscriber records
    #[arg(short = 'f', long)]
    pub foreigners: bool,

    /// Fill the epoch timestamp column from Date + Time
    #[arg(short = 'e', long)]
    pub epoch: bool,

    /// Region file (CSV, optionally gzipped); restricts output to records
    /// from its cells
    #[arg(short = 'r', long, value_name = "FILE")]
    pub region_file: Option<PathBuf>,

    // === Output ===
    /// Root of the output tree under the destination
    #[arg(long, env = "CDRFLOW_OUTPUT_ROOT", default_value = "CDRs")]
    pub output_root: String,

    /// Subdirectory under each date partition for output files
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_subdir: Option<String>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    // === Logging ===
    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Get the number of available CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a spread fraction in [0.0, 1.0).
fn parse_spread(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fraction", s))?;
    if !(0.0..1.0).contains(&value) {
        return Err(format!("{} is not in [0.0, 1.0)", value));
    }
    Ok(value)
}

/// Parse a calendar date in YYYY-MM-DD form.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid YYYY-MM-DD date", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_args() {
        let cli = Cli::parse_from(["cdrflow", "/data/raw", "--date", "2019-06-15"]);
        assert_eq!(cli.source, PathBuf::from("/data/raw"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2019, 6, 15).unwrap());
        assert_eq!(cli.writers, 0);
        assert!(!cli.foreigners);
        assert!(cli.cdr_types.is_empty());
    }

    #[test]
    fn test_full_args() {
        let cli = Cli::parse_from([
            "cdrflow",
            "/data/raw",
            "--date",
            "2019-06-15",
            "-d",
            "/data/clean",
            "-t",
            "voice",
            "-t",
            "data",
            "-n",
            "4",
            "-w",
            "2",
            "-s",
            "200000",
            "--spread",
            "0.1",
            "-f",
            "-e",
            "-o",
            "foreign",
        ]);
        assert_eq!(cli.cdr_types, vec!["voice", "data"]);
        assert_eq!(cli.workers, 4);
        assert_eq!(cli.writers, 2);
        assert_eq!(cli.section_size, 200_000);
        assert_eq!(cli.spread, 0.1);
        assert!(cli.foreigners);
        assert!(cli.epoch);
        assert_eq!(cli.output_subdir.as_deref(), Some("foreign"));
    }

    #[test]
    fn test_env_fallbacks() {
        std::env::set_var("CDRFLOW_OUTPUT_ROOT", "clean_cdrs");
        let cli = Cli::parse_from(["cdrflow", "/data/raw", "--date", "2019-06-15"]);
        assert_eq!(cli.output_root, "clean_cdrs");

        // An explicit flag still wins over the environment
        let cli = Cli::parse_from([
            "cdrflow",
            "/data/raw",
            "--date",
            "2019-06-15",
            "--output-root",
            "other",
        ]);
        assert_eq!(cli.output_root, "other");
        std::env::remove_var("CDRFLOW_OUTPUT_ROOT");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["cdrflow", "/r", "--date", "2019-6-x"]).is_err());
        assert!(Cli::try_parse_from(["cdrflow", "/r", "--date", "2019-06-15", "-n", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["cdrflow", "/r", "--date", "2019-06-15", "--spread", "1.5"])
                .is_err()
        );
    }
}
