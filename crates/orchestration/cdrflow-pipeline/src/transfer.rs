//! Bounded transfer queue between extraction and writer workers.
//!
//! In two-stage mode the extraction workers publish per-file record
//! batches here and the writer workers drain them. The channel is bounded
//! so a slow writing stage throttles the parsers instead of letting
//! parsed records pile up in memory.
//!
//! Shutdown needs no sentinel values: the run controller hands one sender
//! clone to each extraction worker and drops its own, so the channel
//! disconnects exactly when the last extraction worker exits. Writers
//! treat disconnect-on-empty as end of input.

use cdrflow_error::{PipelineError, Result};
use cdrflow_types::{CdrRecord, PartitionKey};
use crossbeam_channel::{Receiver, Sender};

/// The per-file unit handed from extraction to writing: all the surviving
/// records of one input file that belong to one partition.
#[derive(Debug, Clone)]
pub struct TransferBatch {
    pub key: PartitionKey,
    pub records: Vec<CdrRecord>,
}

/// Creates a bounded transfer queue holding at most `capacity` batches.
pub fn transfer_queue(capacity: usize) -> (TransferSender, TransferReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (TransferSender { tx }, TransferReceiver { rx })
}

/// Producer side, cloned once per extraction worker.
#[derive(Debug, Clone)]
pub struct TransferSender {
    tx: Sender<TransferBatch>,
}

impl TransferSender {
    /// Publishes a batch, blocking while the queue is full.
    ///
    /// Fails only when every receiver is gone, which means the whole
    /// writing stage died; that is fatal for the run.
    pub fn send(&self, batch: TransferBatch) -> Result<()> {
        self.tx
            .send(batch)
            .map_err(|_| PipelineError::TransferDisconnected.into())
    }
}

/// Consumer side, cloned once per writer worker.
#[derive(Debug, Clone)]
pub struct TransferReceiver {
    rx: Receiver<TransferBatch>,
}

impl TransferReceiver {
    /// Takes the next batch, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is empty and every sender is gone:
    /// the extraction stage has finished and the writer should move to its
    /// final flush.
    pub fn recv(&self) -> Option<TransferBatch> {
        self.rx.recv().ok()
    }

    /// Takes the next batch without blocking, or `None` when the queue is
    /// currently empty. Used when draining after a shutdown request.
    pub fn try_recv(&self) -> Option<TransferBatch> {
        self.rx.try_recv().ok()
    }

    /// Batches currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}
