//! Gzip CSV encoding and durable, partitioned batch writes.

use crate::accumulator::Flush;
use cdrflow_error::{PipelineError, Result, StoreError};
use cdrflow_store::{with_retry, ObjectStore, RetryConfig};
use cdrflow_types::{CdrRecord, RunConfig};
use flate2::write::GzEncoder;
use std::sync::Arc;
use tracing::{debug, error};

/// Outcome of one durable batch write.
#[derive(Debug, Clone)]
pub struct WrittenBatch {
    /// Store path actually written, after any directory-collision fallback
    pub path: String,
    pub records: u64,
    pub bytes: u64,
}

/// Encodes batches as gzip CSV and writes them to their partition
/// directory with bounded retries.
///
/// Shared read-only by every flushing worker; each write call is
/// self-contained.
pub struct PartitionedWriter {
    store: Arc<dyn ObjectStore>,
    root: String,
    subdir: Option<String>,
    retry: RetryConfig,
}

impl PartitionedWriter {
    pub fn new(store: Arc<dyn ObjectStore>, config: &RunConfig) -> Self {
        Self {
            store,
            root: config.output_root.clone(),
            subdir: config.output_subdir.clone(),
            retry: RetryConfig::new()
                .with_max_retries(config.write_retries)
                .with_initial_backoff_ms(config.write_backoff_ms),
        }
    }

    /// Writes one flushed batch under its partition directory.
    ///
    /// An empty batch is a no-op and writes nothing. Transient write
    /// failures are retried with backoff; an exhausted retry budget is
    /// fatal because the batch's records have already been drained out of
    /// their accumulator and would otherwise vanish silently.
    pub fn write(&self, flush: &Flush, worker_id: usize) -> Result<Option<WrittenBatch>> {
        if flush.batch.is_empty() {
            return Ok(None);
        }

        let key = flush.batch.key();
        let dir = key.relative_dir(&self.root, self.subdir.as_deref());
        let path = format!("{dir}/{}", key.file_name(worker_id, flush.seq, flush.is_final));
        let bytes = encode_batch(flush.batch.records(), &path)?;

        let written =
            with_retry(&self.retry, "put_batch", || self.store.put(&path, &bytes)).map_err(
                |e| {
                    error!(path = %path, error = %e, "Write retries exhausted, batch lost");
                    PipelineError::WriteExhausted {
                        path: path.clone(),
                        attempts: self.retry.max_retries + 1,
                    }
                },
            )?;

        debug!(
            path = %written,
            records = flush.batch.num_records(),
            bytes = bytes.len(),
            seq = flush.seq,
            is_final = flush.is_final,
            "Wrote batch"
        );
        Ok(Some(WrittenBatch {
            path: written,
            records: flush.batch.num_records() as u64,
            bytes: bytes.len() as u64,
        }))
    }
}

/// Serializes records to gzip-compressed CSV with a header row.
fn encode_batch(records: &[CdrRecord], path: &str) -> Result<Vec<u8>> {
    let to_write_error = |reason: String| StoreError::Write {
        path: path.to_string(),
        reason,
    };

    let encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut writer = csv::Writer::from_writer(encoder);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| to_write_error(e.to_string()))?;
    }
    let encoder = writer
        .into_inner()
        .map_err(|e| to_write_error(e.to_string()))?;
    Ok(encoder.finish().map_err(StoreError::from)?)
}
