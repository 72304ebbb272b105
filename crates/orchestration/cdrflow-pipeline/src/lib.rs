//! Parallel extraction-and-partitioning pipeline.
//!
//! Data flow:
//!
//! ```text
//! catalog -> work queue -> extraction workers -+-> local accumulators ----+
//!                                              |                          v
//!                                              +-> transfer queue         partitioned
//!                                                    -> writer workers -> output writer
//! ```
//!
//! The work queue is the only structure mutated by multiple workers; the
//! transfer queue (two-stage mode) is the second. Accumulators and
//! thresholds are exclusively owned by one worker for its whole lifetime,
//! so they need no locking by construction.

pub mod accumulator;
pub mod catalog;
pub mod extractor;
pub mod output;
pub mod runner;
pub mod stats;
pub mod threshold;
pub mod transfer;
pub mod work_queue;
pub mod writer;

pub use accumulator::{BatchAccumulator, Flush};
pub use catalog::{build_catalog, date_prefixes};
pub use output::PartitionedWriter;
pub use runner::run;
pub use stats::{RunStats, RunSummary, SkippedFile};
pub use threshold::randomized_threshold;
pub use transfer::{transfer_queue, TransferBatch, TransferReceiver, TransferSender};
pub use work_queue::WorkQueue;
