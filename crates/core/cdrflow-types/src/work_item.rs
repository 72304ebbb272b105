//! Work item type representing one input file.

use serde::{Deserialize, Serialize};

/// An opaque reference to one source file in the object store.
///
/// Created by the work catalog, consumed exactly once by exactly one
/// extraction worker; the work queue enforces single consumption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFileRef(String);

impl InputFileRef {
    /// Creates a new reference from a store location.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Returns the store location of this file.
    #[inline]
    pub fn location(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InputFileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
