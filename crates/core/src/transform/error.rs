//! Error types for feature transformation.

use thiserror::Error;

use crate::dataset::DatasetError;

/// Errors raised while fitting or applying the preprocessor.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A column the preprocessor needs is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A remaining feature is text but was not declared categorical.
    #[error("Column '{0}' is not numeric and is not declared categorical")]
    NonNumericFeature(String),

    /// A feature column holds missing values after encoding.
    #[error("Feature column '{0}' has missing values")]
    MissingValues(String),

    /// Target values must be integral class labels.
    #[error("Target column '{column}' has a non-integral value at row {row}")]
    InvalidTarget { column: String, row: usize },

    /// Resampling needs both classes present.
    #[error("Target has {0} distinct class(es); exactly 2 are required")]
    ClassCount(usize),

    /// Feature and target row counts differ.
    #[error("Mismatch between number of samples in features ({features}) and target ({target})")]
    RowMismatch { features: usize, target: usize },

    /// The nearest-neighbour index rejected a point.
    #[error("Nearest-neighbour index failed: {0}")]
    NeighbourIndex(String),

    /// Input array width differs from what the preprocessor was fitted on.
    #[error("Expected {expected} feature columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
