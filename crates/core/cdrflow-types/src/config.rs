//! Immutable run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default nominal batch-size threshold (records per output file).
pub const DEFAULT_SECTION_SIZE: usize = 500_000;

/// Default spread fraction for the per-worker threshold jitter.
pub const DEFAULT_SPREAD: f64 = 0.15;

/// Default transfer queue capacity in two-stage mode. The limiting step is
/// the writing, so the queue throttles memory rather than file count.
pub const DEFAULT_TRANSFER_CAPACITY: usize = 500;

/// Configuration for one extraction run, resolved once at start and
/// read-only for every worker afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of extraction workers
    pub workers: usize,

    /// Number of writer workers; 0 runs the single-stage pipeline where
    /// extraction workers flush their own batches
    pub writers: usize,

    /// Nominal row-count threshold that triggers a batch flush
    pub section_size: usize,

    /// Spread fraction for the per-worker threshold jitter (0.0 disables
    /// jitter, making rotation deterministic)
    pub spread: f64,

    /// Transfer queue capacity in two-stage mode
    pub transfer_capacity: usize,

    /// The day whose files this run extracts
    pub target_date: NaiveDate,

    /// Keep only records from foreign subscribers
    pub foreigners_only: bool,

    /// Fill the epoch timestamp column from Date + Time
    pub epoch_time: bool,

    /// Optional subdirectory under the date partition for output files
    pub output_subdir: Option<String>,

    /// Optional restriction to records from these cells
    pub valid_cells: Option<HashSet<i64>>,

    /// Source prefixes to list for input files
    pub source_prefixes: Vec<String>,

    /// Root of the output tree inside the destination store
    pub output_root: String,

    /// Maximum retries for one durable write before it is fatal
    pub write_retries: u32,

    /// Initial backoff between write retries, in milliseconds
    pub write_backoff_ms: u64,
}

impl RunConfig {
    /// Creates a configuration for a target day with defaults everywhere
    /// else.
    pub fn new(target_date: NaiveDate) -> Self {
        Self {
            workers: available_parallelism(),
            writers: 0,
            section_size: DEFAULT_SECTION_SIZE,
            spread: DEFAULT_SPREAD,
            transfer_capacity: DEFAULT_TRANSFER_CAPACITY,
            target_date,
            foreigners_only: false,
            epoch_time: false,
            output_subdir: None,
            valid_cells: None,
            source_prefixes: Vec::new(),
            output_root: "CDRs".to_string(),
            write_retries: 3,
            write_backoff_ms: 100,
        }
    }

    /// Set the number of extraction workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the number of writer workers (0 = single-stage).
    pub fn with_writers(mut self, writers: usize) -> Self {
        self.writers = writers;
        self
    }

    /// Set the nominal section size.
    pub fn with_section_size(mut self, section_size: usize) -> Self {
        self.section_size = section_size;
        self
    }

    /// Set the threshold spread fraction.
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    /// Set the transfer queue capacity.
    pub fn with_transfer_capacity(mut self, capacity: usize) -> Self {
        self.transfer_capacity = capacity;
        self
    }

    /// Keep only foreign-subscriber records.
    pub fn with_foreigners_only(mut self, enabled: bool) -> Self {
        self.foreigners_only = enabled;
        self
    }

    /// Fill the epoch timestamp column.
    pub fn with_epoch_time(mut self, enabled: bool) -> Self {
        self.epoch_time = enabled;
        self
    }

    /// Set the output subdirectory under the date partition.
    pub fn with_output_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.output_subdir = Some(subdir.into());
        self
    }

    /// Restrict records to the given cell identifiers.
    pub fn with_valid_cells(mut self, cells: HashSet<i64>) -> Self {
        self.valid_cells = Some(cells);
        self
    }

    /// Set the source prefixes to list.
    pub fn with_source_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.source_prefixes = prefixes;
        self
    }

    /// Set the output root inside the destination store.
    pub fn with_output_root(mut self, root: impl Into<String>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Set the durable-write retry budget.
    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.write_retries = retries;
        self
    }

    /// Set the initial durable-write backoff in milliseconds.
    pub fn with_write_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.write_backoff_ms = backoff_ms;
        self
    }

    /// Returns true when the run decouples parsing from writing through
    /// the transfer queue.
    #[inline]
    pub fn two_stage(&self) -> bool {
        self.writers > 0
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.section_size == 0 {
            return Err("section_size must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.spread) {
            return Err("spread must be in [0.0, 1.0)".to_string());
        }
        if self.two_stage() && self.transfer_capacity == 0 {
            return Err("transfer_capacity must be at least 1".to_string());
        }
        if self.source_prefixes.is_empty() {
            return Err("at least one source prefix is required".to_string());
        }
        if self.output_root.is_empty() {
            return Err("output_root must not be empty".to_string());
        }
        Ok(())
    }
}

/// Get the number of available CPUs.
fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
