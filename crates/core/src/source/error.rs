//! Error types for the source connector.

use thiserror::Error;

/// Errors raised while reading the source collection.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing or unusable connection configuration. Never retried.
    #[error("Source configuration error: {0}")]
    Configuration(String),

    /// Transient failure reaching the store.
    #[error("Source connectivity error: {0}")]
    Connectivity(String),

    /// Collection does not exist in the database.
    #[error("Collection '{collection}' not found in database '{database}'")]
    CollectionNotFound { database: String, collection: String },

    /// Documents could not be decoded.
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether the failure may clear up on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
