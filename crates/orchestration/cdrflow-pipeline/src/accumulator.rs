//! Batch accumulation with threshold rotation.

use cdrflow_types::{CdrRecord, PartitionKey, RecordBatch};

/// A batch handed off for writing, with the naming inputs the output
/// writer needs alongside the records.
#[derive(Debug, Clone, PartialEq)]
pub struct Flush {
    pub batch: RecordBatch,
    /// Per-accumulator sequence number, starting at 0
    pub seq: u32,
    /// Marks the forced end-of-run flush
    pub is_final: bool,
}

/// Accumulates records for one partition and rotates full batches out.
///
/// Owned by exactly one worker; never shared. The rotation check runs
/// after every append, so no rotated batch ever exceeds the threshold. An
/// accumulator built without a threshold never rotates and only emits on
/// the final flush, which is how the spillover stream produces a single
/// file per worker.
#[derive(Debug)]
pub struct BatchAccumulator {
    key: PartitionKey,
    threshold: Option<usize>,
    buffer: Vec<CdrRecord>,
    seq: u32,
}

impl BatchAccumulator {
    /// Creates an accumulator for one partition. `threshold` of `None`
    /// disables rotation.
    pub fn new(key: PartitionKey, threshold: Option<usize>) -> Self {
        Self {
            key,
            threshold,
            buffer: Vec::new(),
            seq: 0,
        }
    }

    /// Appends one record, returning a full batch when the append reached
    /// the rotation threshold.
    pub fn append(&mut self, record: CdrRecord) -> Option<Flush> {
        self.buffer.push(record);
        match self.threshold {
            Some(threshold) if self.buffer.len() >= threshold => Some(self.rotate(false)),
            _ => None,
        }
    }

    /// Flushes whatever is buffered as the accumulator's final batch.
    ///
    /// Returns `None` when the buffer is empty; calling it again after a
    /// final flush is a no-op, so the end-of-run path may be retried
    /// safely.
    pub fn take_final(&mut self) -> Option<Flush> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.rotate(true))
    }

    /// Records currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn rotate(&mut self, is_final: bool) -> Flush {
        let records = std::mem::take(&mut self.buffer);
        let seq = self.seq;
        self.seq += 1;
        Flush {
            batch: RecordBatch::new(self.key, records),
            seq,
            is_final,
        }
    }
}
