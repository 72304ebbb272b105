//! Object-store boundary for the cdrflow pipeline.
//!
//! The pipeline talks to storage exclusively through [`ObjectStore`], so
//! the orchestration layer can run against an in-memory fake in tests and
//! a real backend in production. [`LocalStore`] is the filesystem-rooted
//! implementation used by local runs and the integration tests.

mod local;
mod retry;

pub use local::LocalStore;
pub use retry::{with_retry, RetryConfig};

use cdrflow_error::Result;

/// Blocking object-store operations consumed by the pipeline.
///
/// All calls are blocking I/O local to the worker performing them; no
/// worker ever shares an in-flight operation with another.
pub trait ObjectStore: Send + Sync {
    /// Lists all object locations under a prefix, in a stable order.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fetches the full contents of one object.
    fn fetch(&self, location: &str) -> Result<Vec<u8>>;

    /// Durably writes `bytes` under `path`, creating intermediate
    /// directories as needed.
    ///
    /// The write is atomic from the caller's perspective: either the full
    /// contents become visible under the final name or the call fails.
    /// If an ancestor of `path` exists as a regular file, implementations
    /// fall back to a randomized alternate directory instead of failing;
    /// the returned path is the one actually written.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String>;
}
