//! Error types for object storage.

use thiserror::Error;

/// Errors raised by an object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object stored under the key.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Key is empty or escapes the bucket.
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Transient failure reaching the store.
    #[error("Storage connectivity error: {0}")]
    Connectivity(String),

    /// Local I/O failure.
    #[error("Storage I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }

    /// Whether the failure may clear up on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
