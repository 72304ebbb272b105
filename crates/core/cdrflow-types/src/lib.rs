//! Core data types shared across the cdrflow pipeline.
//!
//! Leaf crate with no internal dependencies: records, day classification,
//! partition keys, batches, work items, and the immutable run configuration.

mod batch;
mod config;
mod partition;
mod record;
mod work_item;

pub use batch::RecordBatch;
pub use config::{RunConfig, DEFAULT_SECTION_SIZE, DEFAULT_SPREAD, DEFAULT_TRANSFER_CAPACITY};
pub use partition::{PartitionKey, Stream};
pub use record::{CdrRecord, DayClass, DayWindow};
pub use work_item::InputFileRef;
