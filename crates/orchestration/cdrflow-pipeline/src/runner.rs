//! Run controller: catalog, worker pools, and end-of-run accounting.

use crate::catalog::build_catalog;
use crate::extractor::ExtractionWorker;
use crate::output::PartitionedWriter;
use crate::stats::{RunStats, RunSummary};
use crate::transfer::transfer_queue;
use crate::work_queue::WorkQueue;
use crate::writer::WriterWorker;
use cdrflow_error::{CdrError, PipelineError, Result};
use cdrflow_store::ObjectStore;
use cdrflow_types::RunConfig;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{error, info};

/// Executes one extraction run to completion, reading input files from
/// `source` and writing the partitioned output tree into `dest`.
///
/// Configuration and catalog failures surface as `Err` before any worker
/// starts. Once workers are running, failures are recorded in the summary
/// instead: the returned [`RunSummary`] reports `success() == false` with
/// the fatal causes, so a partially failed run still yields its counters.
pub fn run(
    config: RunConfig,
    source: Arc<dyn ObjectStore>,
    dest: Arc<dyn ObjectStore>,
) -> Result<RunSummary> {
    config.validate().map_err(CdrError::Config)?;
    let started = Instant::now();
    let config = Arc::new(config);
    let stats = Arc::new(RunStats::new());

    let catalog = build_catalog(source.as_ref(), &config)?;
    let catalog_size = catalog.len();
    let queue = Arc::new(WorkQueue::new());
    for file in catalog {
        queue.put(file);
    }

    info!(
        files = catalog_size,
        workers = config.workers,
        writers = config.writers,
        target_date = %config.target_date,
        two_stage = config.two_stage(),
        "Starting extraction run"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let output = Arc::new(PartitionedWriter::new(dest, &config));

    if config.two_stage() {
        let (sender, receiver) = transfer_queue(config.transfer_capacity);

        let writers: Vec<JoinHandle<()>> = (0..config.writers)
            .map(|writer_id| {
                let worker = WriterWorker::new(
                    writer_id,
                    config.clone(),
                    receiver.clone(),
                    output.clone(),
                    stats.clone(),
                    shutdown.clone(),
                );
                std::thread::spawn(move || worker.run())
            })
            .collect();
        drop(receiver);

        let extractors: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|worker_id| {
                let worker = ExtractionWorker::new(
                    worker_id,
                    config.clone(),
                    queue.clone(),
                    source.clone(),
                    stats.clone(),
                    shutdown.clone(),
                );
                let sender = sender.clone();
                std::thread::spawn(move || worker.run_transfer(sender))
            })
            .collect();
        // The controller's sender must go away so the channel disconnects
        // once the last extraction worker exits
        drop(sender);

        join_all(extractors, "extraction", &stats);
        join_all(writers, "writer", &stats);
    } else {
        let extractors: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|worker_id| {
                let worker = ExtractionWorker::new(
                    worker_id,
                    config.clone(),
                    queue.clone(),
                    source.clone(),
                    stats.clone(),
                    shutdown.clone(),
                );
                let output = output.clone();
                std::thread::spawn(move || worker.run_direct(output))
            })
            .collect();
        join_all(extractors, "extraction", &stats);
    }

    // A clean run must account for the whole catalog; a shortfall means a
    // reference was taken but never processed or skipped.
    if !stats.has_fatal() {
        let accounted = stats.files_accounted() as usize;
        if accounted != catalog_size {
            let cause = PipelineError::WorkAccounting {
                expected: catalog_size,
                seen: accounted,
            };
            error!(error = %cause, "Run failed accounting check");
            stats.record_fatal(cause.to_string());
        }
    }

    let summary = stats.snapshot(catalog_size, started);
    if summary.success() {
        info!(
            files_processed = summary.files_processed,
            files_skipped = summary.files_skipped,
            records_written = summary.records_written,
            batches_written = summary.batches_written,
            bytes_written = summary.bytes_written,
            elapsed_secs = summary.elapsed_secs,
            "Extraction run complete"
        );
    } else {
        error!(
            fatal_causes = summary.fatal_errors.len(),
            files_processed = summary.files_processed,
            "Extraction run failed"
        );
    }
    Ok(summary)
}

fn join_all(handles: Vec<JoinHandle<()>>, pool: &str, stats: &RunStats) {
    for handle in handles {
        if handle.join().is_err() {
            // A panicking worker drops its in-flight file reference, which
            // the accounting check will also catch; record the direct
            // cause for the summary.
            error!(pool, "Worker thread panicked");
            stats.record_fatal(format!("{pool} worker panicked"));
        }
    }
}
