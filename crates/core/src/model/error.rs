//! Error types for model fitting and persistence.

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::transform::TransformError;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Nothing to fit on.
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Label slice length differs from the number of rows.
    #[error("Got {labels} labels for {rows} rows")]
    LabelMismatch { rows: usize, labels: usize },

    /// Input width differs from what the classifier was fitted on.
    #[error("Classifier expects {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    /// Bundle could not be encoded or decoded.
    #[error("Bundle serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
