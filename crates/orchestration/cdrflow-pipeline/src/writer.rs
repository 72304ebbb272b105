//! Writer workers for the two-stage pipeline.

use crate::accumulator::{BatchAccumulator, Flush};
use crate::output::PartitionedWriter;
use crate::stats::RunStats;
use crate::threshold::randomized_threshold;
use crate::transfer::TransferReceiver;
use cdrflow_types::{PartitionKey, RunConfig, Stream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// One writer worker. Drains the transfer queue into its own accumulators
/// and flushes full batches, exactly like a single-stage extraction worker
/// would, just decoupled from parsing.
///
/// The worker keeps draining after the extraction stage finishes: its loop
/// ends only when the queue is empty *and* every sender is gone, so queued
/// batches are never abandoned on a clean shutdown. When a fatal error
/// elsewhere raises the shutdown flag, the worker drains what is already
/// queued and exits without waiting for more work.
pub struct WriterWorker {
    writer_id: usize,
    config: Arc<RunConfig>,
    receiver: TransferReceiver,
    output: Arc<PartitionedWriter>,
    stats: Arc<RunStats>,
    shutdown: Arc<AtomicBool>,
}

impl WriterWorker {
    pub fn new(
        writer_id: usize,
        config: Arc<RunConfig>,
        receiver: TransferReceiver,
        output: Arc<PartitionedWriter>,
        stats: Arc<RunStats>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            writer_id,
            config,
            receiver,
            output,
            stats,
            shutdown,
        }
    }

    pub fn run(self) {
        let threshold = randomized_threshold(
            self.config.section_size,
            self.config.spread,
            self.writer_id,
            &mut rand::rng(),
        );
        info!(writer = self.writer_id, threshold, "Writer worker started");

        let mut today =
            BatchAccumulator::new(PartitionKey::today(self.config.target_date), Some(threshold));
        let mut yesterday =
            BatchAccumulator::new(PartitionKey::yesterday(self.config.target_date), None);

        loop {
            // After a shutdown request, drain what is already queued but
            // stop once the queue is observed empty instead of waiting
            // for more work
            let next = if self.shutdown.load(Ordering::Relaxed) {
                self.receiver.try_recv()
            } else {
                self.receiver.recv()
            };
            let Some(batch) = next else {
                break;
            };

            let accumulator = match batch.key.stream() {
                Stream::Today => &mut today,
                Stream::Yesterday => &mut yesterday,
            };
            for record in batch.records {
                if let Some(flush) = accumulator.append(record) {
                    if !self.flush(&flush) {
                        // The flush already raised the shutdown flag;
                        // exiting also drops this receiver, which
                        // disconnects the senders once no writer survives
                        return;
                    }
                }
            }
        }

        for accumulator in [&mut today, &mut yesterday] {
            if let Some(flush) = accumulator.take_final() {
                if !self.flush(&flush) {
                    return;
                }
            }
        }
        info!(writer = self.writer_id, "Writer worker finished");
    }

    fn flush(&self, flush: &Flush) -> bool {
        match self.output.write(flush, self.writer_id) {
            Ok(Some(written)) => {
                self.stats.record_batch(written.records, written.bytes);
                true
            }
            Ok(None) => true,
            Err(e) => {
                error!(writer = self.writer_id, error = %e, "Fatal write failure");
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
    use crate::transfer::{transfer_queue, TransferBatch};
    use cdrflow_store::LocalStore;
    use cdrflow_types::CdrRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(time: u32) -> CdrRecord {
        CdrRecord {
            date: 20190615,
            time,
            cell_id: 7,
            country: "FRA".to_string(),
            time_epoch: None,
        }
    }

    #[test]
    fn test_writer_drains_then_stops_once_shutdown_is_flagged() {
        let dir = TempDir::new().unwrap();
        let target = NaiveDate::from_ymd_opt(2019, 6, 15).unwrap();
        let config = Arc::new(
            RunConfig::new(target)
                .with_source_prefixes(vec!["in".to_string()])
                .with_writers(1)
                .with_section_size(1000)
                .with_spread(0.0)
                .with_write_backoff_ms(1),
        );
        let output = Arc::new(PartitionedWriter::new(
            Arc::new(LocalStore::new(dir.path())),
            &config,
        ));
        let stats = Arc::new(crate::stats::RunStats::new());
        let shutdown = Arc::new(AtomicBool::new(true));

        let (sender, receiver) = transfer_queue(8);
        sender
            .send(TransferBatch {
                key: PartitionKey::today(target),
                records: vec![record(1), record(2)],
            })
            .unwrap();

        let worker = WriterWorker::new(
            0,
            config,
            receiver,
            output,
            stats.clone(),
            shutdown,
        );
        // The sender stays alive, so a writer waiting on the channel
        // would block here forever
        let handle = std::thread::spawn(move || worker.run());
        handle.join().unwrap();

        // The queued batch was drained and final-flushed before exiting
        assert_eq!(stats.records_written(), 2);
        drop(sender);
    }
}
