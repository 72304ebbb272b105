//! Run statistics and the end-of-run summary.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// One input file the run gave up on, with the reason.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedFile {
    pub location: String,
    pub reason: String,
}

/// Counters shared by every worker in a run.
///
/// The hot-path counters are relaxed atomics; only the skip list and the
/// fatal causes take a lock, and those paths are rare by construction.
#[derive(Debug, Default)]
pub struct RunStats {
    files_processed: AtomicU64,
    files_skipped: AtomicU64,
    records_kept: AtomicU64,
    records_stale: AtomicU64,
    records_filtered: AtomicU64,
    records_malformed: AtomicU64,
    batches_written: AtomicU64,
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    skipped: Mutex<Vec<SkippedFile>>,
    fatal: Mutex<Vec<String>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fully processed input file.
    pub fn record_file(&self, kept: u64, stale: u64, filtered: u64, malformed: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.records_kept.fetch_add(kept, Ordering::Relaxed);
        self.records_stale.fetch_add(stale, Ordering::Relaxed);
        self.records_filtered.fetch_add(filtered, Ordering::Relaxed);
        self.records_malformed.fetch_add(malformed, Ordering::Relaxed);
    }

    /// Records one input file the run skipped entirely.
    pub fn record_skip(&self, location: &str, reason: String) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
        self.skipped.lock().push(SkippedFile {
            location: location.to_string(),
            reason,
        });
    }

    /// Records one durably written batch.
    pub fn record_batch(&self, records: u64, bytes: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.records_written.fetch_add(records, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a fatal cause. Any recorded cause marks the run failed.
    pub fn record_fatal(&self, cause: String) {
        self.fatal.lock().push(cause);
    }

    pub fn has_fatal(&self) -> bool {
        !self.fatal.lock().is_empty()
    }

    pub fn files_processed(&self) -> u64 {
        self.files_processed.load(Ordering::Relaxed)
    }

    pub fn files_skipped(&self) -> u64 {
        self.files_skipped.load(Ordering::Relaxed)
    }

    /// Files accounted for, processed or skipped. At a clean end of run
    /// this must equal the catalog size.
    pub fn files_accounted(&self) -> u64 {
        self.files_processed() + self.files_skipped()
    }

    pub fn records_kept(&self) -> u64 {
        self.records_kept.load(Ordering::Relaxed)
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Snapshots the counters into an end-of-run summary.
    pub fn snapshot(&self, catalog_files: usize, started: Instant) -> RunSummary {
        RunSummary {
            catalog_files,
            files_processed: self.files_processed(),
            files_skipped: self.files_skipped(),
            records_kept: self.records_kept(),
            records_stale: self.records_stale.load(Ordering::Relaxed),
            records_filtered: self.records_filtered.load(Ordering::Relaxed),
            records_malformed: self.records_malformed.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            records_written: self.records_written(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            elapsed_secs: started.elapsed().as_secs_f64(),
            skipped_files: self.skipped.lock().clone(),
            fatal_errors: self.fatal.lock().clone(),
        }
    }
}

/// Final report for one extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub catalog_files: usize,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub records_kept: u64,
    pub records_stale: u64,
    pub records_filtered: u64,
    pub records_malformed: u64,
    pub batches_written: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub elapsed_secs: f64,
    pub skipped_files: Vec<SkippedFile>,
    pub fatal_errors: Vec<String>,
}

impl RunSummary {
    /// A run succeeds when nothing fatal was recorded. Skipped files and
    /// dropped records degrade the output but do not fail the run.
    pub fn success(&self) -> bool {
        self.fatal_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RunStats::new();
        stats.record_file(100, 2, 10, 1);
        stats.record_file(50, 0, 0, 0);
        stats.record_skip("in/bad.csv.gz", "not gzip".to_string());
        stats.record_batch(150, 4096);

        let summary = stats.snapshot(3, Instant::now());
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.records_kept, 150);
        assert_eq!(summary.records_stale, 2);
        assert_eq!(summary.records_filtered, 10);
        assert_eq!(summary.records_malformed, 1);
        assert_eq!(summary.batches_written, 1);
        assert_eq!(summary.records_written, 150);
        assert_eq!(summary.bytes_written, 4096);
        assert_eq!(summary.skipped_files[0].location, "in/bad.csv.gz");
        assert_eq!(stats.files_accounted(), 3);
    }

    #[test]
    fn test_success_tracks_fatal_causes() {
        let stats = RunStats::new();
        assert!(stats.snapshot(0, Instant::now()).success());

        stats.record_fatal("write retries exhausted".to_string());
        assert!(stats.has_fatal());
        let summary = stats.snapshot(0, Instant::now());
        assert!(!summary.success());
        assert_eq!(summary.fatal_errors.len(), 1);
    }

    #[test]
    fn test_summary_serializes() {
        let stats = RunStats::new();
        stats.record_file(1, 0, 0, 0);
        let json = serde_json::to_string(&stats.snapshot(1, Instant::now())).unwrap();
        assert!(json.contains("\"files_processed\":1"));
    }
}
