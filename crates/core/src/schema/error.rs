//! Error types for schema loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema file does not exist.
    #[error("Schema file not found: {0}")]
    FileNotFound(PathBuf),

    /// Schema file could not be read.
    #[error("Failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML did not match the schema document shape.
    #[error("Failed to parse schema: {0}")]
    Parse(String),

    /// Document parsed but violates a structural rule.
    #[error("Invalid schema: {0}")]
    Invalid(String),
}
