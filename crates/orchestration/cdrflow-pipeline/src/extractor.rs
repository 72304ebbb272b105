//! Extraction workers: fetch, parse, classify, and dispatch.

use crate::accumulator::{BatchAccumulator, Flush};
use crate::output::PartitionedWriter;
use crate::stats::RunStats;
use crate::threshold::randomized_threshold;
use crate::transfer::{TransferBatch, TransferSender};
use crate::work_queue::WorkQueue;
use cdrflow_error::Result;
use cdrflow_reader::{parse_cdr_file, RecordFilter};
use cdrflow_store::ObjectStore;
use cdrflow_types::{CdrRecord, DayClass, DayWindow, InputFileRef, PartitionKey, RunConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Splits parsed records into today and yesterday runs, discarding stale
/// ones. Returns the two runs and the stale count.
pub(crate) fn split_by_day(
    records: Vec<CdrRecord>,
    window: &DayWindow,
) -> (Vec<CdrRecord>, Vec<CdrRecord>, u64) {
    let mut today = Vec::new();
    let mut yesterday = Vec::new();
    let mut stale = 0u64;
    for record in records {
        match window.classify(record.date) {
            DayClass::Today => today.push(record),
            DayClass::Yesterday => yesterday.push(record),
            DayClass::Stale => stale += 1,
        }
    }
    (today, yesterday, stale)
}

/// One extraction worker. Pulls file references off the shared queue until
/// it drains, parses and classifies each file, and dispatches the
/// surviving records either to its own accumulators (single-stage) or to
/// the transfer queue (two-stage).
///
/// A file that cannot be fetched or parsed is recorded as skipped and the
/// worker moves on; only write exhaustion and queue protocol violations
/// take the run down.
pub struct ExtractionWorker {
    worker_id: usize,
    config: Arc<RunConfig>,
    queue: Arc<WorkQueue>,
    store: Arc<dyn ObjectStore>,
    stats: Arc<RunStats>,
    shutdown: Arc<AtomicBool>,
}

impl ExtractionWorker {
    pub fn new(
        worker_id: usize,
        config: Arc<RunConfig>,
        queue: Arc<WorkQueue>,
        store: Arc<dyn ObjectStore>,
        stats: Arc<RunStats>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            worker_id,
            config,
            queue,
            store,
            stats,
            shutdown,
        }
    }

    /// Single-stage loop: this worker owns its accumulators and flushes
    /// its own batches.
    pub fn run_direct(self, output: Arc<PartitionedWriter>) {
        let window = DayWindow::for_target(self.config.target_date);
        let threshold = randomized_threshold(
            self.config.section_size,
            self.config.spread,
            self.worker_id,
            &mut rand::rng(),
        );
        info!(worker = self.worker_id, threshold, "Extraction worker started");

        let mut today =
            BatchAccumulator::new(PartitionKey::today(self.config.target_date), Some(threshold));
        let mut yesterday =
            BatchAccumulator::new(PartitionKey::yesterday(self.config.target_date), None);

        while !self.shutdown.load(Ordering::Relaxed) {
            let Some(file) = self.queue.try_take() else {
                break;
            };
            let (today_run, yesterday_run) = match self.extract(&file, &window) {
                Ok(runs) => runs,
                Err(e) => {
                    warn!(worker = self.worker_id, file = %file, error = %e, "Skipping file");
                    self.stats.record_skip(file.location(), e.to_string());
                    continue;
                }
            };

            for record in today_run {
                if let Some(flush) = today.append(record) {
                    if !self.flush(&output, &flush) {
                        return;
                    }
                }
            }
            for record in yesterday_run {
                // No threshold on the spillover accumulator, so this
                // never rotates mid-run
                yesterday.append(record);
            }
        }

        // Forced end-of-run flush; empty accumulators write nothing
        for accumulator in [&mut today, &mut yesterday] {
            if let Some(flush) = accumulator.take_final() {
                if !self.flush(&output, &flush) {
                    return;
                }
            }
        }
        info!(worker = self.worker_id, "Extraction worker finished");
    }

    /// Two-stage loop: parsed records go to the transfer queue, batching
    /// and writing belong to the writer workers.
    pub fn run_transfer(self, sender: TransferSender) {
        let window = DayWindow::for_target(self.config.target_date);
        let today_key = PartitionKey::today(self.config.target_date);
        let yesterday_key = PartitionKey::yesterday(self.config.target_date);
        info!(worker = self.worker_id, "Extraction worker started (transfer mode)");

        while !self.shutdown.load(Ordering::Relaxed) {
            let Some(file) = self.queue.try_take() else {
                break;
            };
            let (today_run, yesterday_run) = match self.extract(&file, &window) {
                Ok(runs) => runs,
                Err(e) => {
                    warn!(worker = self.worker_id, file = %file, error = %e, "Skipping file");
                    self.stats.record_skip(file.location(), e.to_string());
                    continue;
                }
            };

            for (key, records) in [(today_key, today_run), (yesterday_key, yesterday_run)] {
                if records.is_empty() {
                    continue;
                }
                if let Err(e) = sender.send(TransferBatch { key, records }) {
                    error!(worker = self.worker_id, error = %e, "Writing stage is gone");
                    self.stats.record_fatal(e.to_string());
                    self.shutdown.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
        info!(worker = self.worker_id, "Extraction worker finished");
    }

    /// Fetches and parses one file, returning the classified record runs.
    fn extract(
        &self,
        file: &InputFileRef,
        window: &DayWindow,
    ) -> Result<(Vec<CdrRecord>, Vec<CdrRecord>)> {
        let bytes = self.store.fetch(file.location())?;
        let filter = RecordFilter::new(
            self.config.foreigners_only,
            self.config.valid_cells.as_ref(),
            self.config.epoch_time,
        );
        let outcome = parse_cdr_file(&bytes, file.location(), &filter)?;
        let (today, yesterday, stale) = split_by_day(outcome.records, window);

        self.stats.record_file(
            (today.len() + yesterday.len()) as u64,
            stale,
            outcome.filtered,
            outcome.malformed,
        );
        Ok((today, yesterday))
    }

    /// Writes one flush, recording it. Returns false on a fatal write
    /// failure, after flagging the run for shutdown.
    fn flush(&self, output: &PartitionedWriter, flush: &Flush) -> bool {
        match output.write(flush, self.worker_id) {
            Ok(Some(written)) => {
                self.stats.record_batch(written.records, written.bytes);
                true
            }
            Ok(None) => true,
            Err(e) => {
                error!(worker = self.worker_id, error = %e, "Fatal write failure");
                self.stats.record_fatal(e.to_string());
                self.shutdown.store(true, Ordering::Relaxed);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: u32) -> CdrRecord {
        CdrRecord {
            date,
            time: 120000,
            cell_id: 7,
            country: "FRA".to_string(),
            time_epoch: None,
        }
    }

    #[test]
    fn test_split_by_day() {
        let window = DayWindow::for_target(NaiveDate::from_ymd_opt(2019, 6, 15).unwrap());
        let records = vec![
            record(20190615),
            record(20190614),
            record(20190613),
            record(20190615),
            record(20190612),
        ];

        let (today, yesterday, stale) = split_by_day(records, &window);
        assert_eq!(today.len(), 2);
        assert_eq!(yesterday.len(), 1);
        assert_eq!(stale, 2);
        assert!(today.iter().all(|r| r.date == 20190615));
        assert_eq!(yesterday[0].date, 20190614);
    }
}
