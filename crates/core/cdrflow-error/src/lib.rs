//! Error types for the cdrflow pipeline.
//!
//! This crate provides:
//! - [`CdrError`] - Top-level error enum for all pipeline errors
//! - Domain-specific errors ([`StoreError`], [`ParseError`], [`PipelineError`])
//! - A [`Result`] alias used throughout the workspace
//!
//! The taxonomy mirrors how errors are recovered:
//! - store fetch and parse errors are recovered locally (file skipped or
//!   record dropped) and counted,
//! - pipeline protocol errors and exhausted write retries are fatal and
//!   propagate to the run controller.

use thiserror::Error;

/// Top-level error type for cdrflow.
#[derive(Error, Debug)]
pub enum CdrError {
    /// Object-store errors (listing, fetch, durable write)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Record parsing errors (decompression, malformed files)
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Pipeline protocol errors (work accounting, queues, write exhaustion)
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Object-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Listing a prefix failed
    #[error("Listing failed for {prefix}: {reason}")]
    List { prefix: String, reason: String },

    /// Fetching an object failed
    #[error("Fetch failed for {location}: {reason}")]
    Fetch { location: String, reason: String },

    /// Durable write failed
    #[error("Write failed for {path}: {reason}")]
    Write { path: String, reason: String },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Record parsing errors.
///
/// A malformed *record* inside an otherwise good file is dropped and
/// counted, not surfaced as an error; these variants cover failures that
/// make the whole file unreadable.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file could not be decompressed
    #[error("Decompression failed for {location}: {reason}")]
    Decompression { location: String, reason: String },

    /// The file has no parseable header or structure
    #[error("Invalid file format for {location}: {reason}")]
    InvalidFormat { location: String, reason: String },

    /// I/O error while reading the record stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline protocol errors. All of these are fatal for the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The work queue drained but processed + skipped does not cover the
    /// catalog, meaning a worker died with a ref in flight.
    #[error("Work accounting mismatch: catalog has {expected} files, workers account for {seen}")]
    WorkAccounting { expected: usize, seen: usize },

    /// The transfer queue disconnected while producers were still running.
    #[error("Transfer queue disconnected unexpectedly")]
    TransferDisconnected,

    /// A durable write kept failing after bounded retries; the batch
    /// contents are lost.
    #[error("Write retries exhausted for {path} after {attempts} attempts")]
    WriteExhausted { path: String, attempts: u32 },
}

impl CdrError {
    /// Returns true when the error must abort the whole run rather than
    /// being recovered locally by the worker that saw it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CdrError::Pipeline(_) | CdrError::Config(_))
    }
}

/// Result type alias using CdrError.
pub type Result<T> = std::result::Result<T, CdrError>;
