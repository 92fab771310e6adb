//! Error types for the dataset module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, reading or writing row sets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Columns of a frame must all have the same number of rows.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Column names must be unique.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A required column is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column could not be converted to numbers.
    #[error("Column '{column}' of type {dtype} is not numeric")]
    NonNumeric { column: String, dtype: String },

    /// CSV row is malformed.
    #[error("Malformed CSV at {path}: {reason}")]
    MalformedCsv { path: PathBuf, reason: String },

    /// CSV codec error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
