//! Shared work queue of input file references.

use cdrflow_types::InputFileRef;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO queue of input files shared by the extraction workers.
///
/// Take is non-blocking: an empty queue means the catalog is exhausted and
/// the taker should move to its final flush, never wait for more work. The
/// queue is populated once, before any worker starts, so emptiness is a
/// termination signal rather than a race.
#[derive(Debug, Default)]
pub struct WorkQueue {
    inner: Mutex<VecDeque<InputFileRef>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file reference to the back of the queue.
    pub fn put(&self, item: InputFileRef) {
        self.inner.lock().push_back(item);
    }

    /// Takes the next file reference, or `None` when the queue is empty.
    ///
    /// Each reference is handed to exactly one caller.
    pub fn try_take(&self) -> Option<InputFileRef> {
        self.inner.lock().pop_front()
    }

    /// Number of references still queued.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
