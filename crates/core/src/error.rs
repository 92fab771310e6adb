//! Stage-level error taxonomy.
//!
//! Collaborator errors are folded into [`StageError`] at the stage boundary,
//! and the pipeline runner wraps that with the stage and the action that was in
//! progress.

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::model::ModelError;
use crate::pipeline::Stage;
use crate::schema::SchemaError;
use crate::source::SourceError;
use crate::state::RunStoreError;
use crate::storage::StorageError;
use crate::transform::TransformError;

/// Failure inside a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Missing or invalid schema or connection configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Source or object store unreachable after any retries.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Serialization or storage I/O failure while reading or writing an artifact.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Data did not have the shape a stage needs.
    #[error("data error: {0}")]
    Data(String),

    /// Classifier could not be fitted or applied.
    #[error("model error: {0}")]
    Model(String),
}

impl StageError {
    /// Short label used in metrics and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Connectivity(_) => "connectivity",
            Self::Persistence(_) => "persistence",
            Self::Data(_) => "data",
            Self::Model(_) => "model",
        }
    }
}

impl From<SourceError> for StageError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Configuration(_) | SourceError::CollectionNotFound { .. } => {
                Self::Configuration(e.to_string())
            }
            SourceError::Connectivity(_) => Self::Connectivity(e.to_string()),
            SourceError::Malformed(_) => Self::Data(e.to_string()),
        }
    }
}

impl From<StorageError> for StageError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Connectivity(_) => Self::Connectivity(e.to_string()),
            StorageError::InvalidKey(_) => Self::Configuration(e.to_string()),
            StorageError::NotFound(_) | StorageError::Io { .. } => Self::Persistence(e.to_string()),
        }
    }
}

impl From<DatasetError> for StageError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::Io(_) | DatasetError::Csv(_) | DatasetError::MalformedCsv { .. } => {
                Self::Persistence(e.to_string())
            }
            _ => Self::Data(e.to_string()),
        }
    }
}

impl From<SchemaError> for StageError {
    fn from(e: SchemaError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<TransformError> for StageError {
    fn from(e: TransformError) -> Self {
        match e {
            TransformError::Dataset(inner) => inner.into(),
            other => Self::Data(other.to_string()),
        }
    }
}

impl From<ModelError> for StageError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Serialization(_) => Self::Persistence(e.to_string()),
            ModelError::Transform(inner) => inner.into(),
            other => Self::Model(other.to_string()),
        }
    }
}

impl From<RunStoreError> for StageError {
    fn from(e: RunStoreError) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for StageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for StageError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

/// A stage failure with the stage and the action being attempted.
#[derive(Debug, Error)]
#[error("{stage} stage failed while {action}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub action: String,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, action: impl Into<String>, source: StageError) -> Self {
        Self {
            stage,
            action: action.into(),
            source,
        }
    }
}

/// Attach stage context to a fallible stage call.
pub trait StageContext<T> {
    fn in_stage(self, stage: Stage, action: &str) -> Result<T, PipelineError>;
}

impl<T, E: Into<StageError>> StageContext<T> for Result<T, E> {
    fn in_stage(self, stage: Stage, action: &str) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, action, e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_map_to_taxonomy() {
        let e: StageError = SourceError::Configuration("missing".into()).into();
        assert_eq!(e.kind(), "configuration");
        let e: StageError = SourceError::Connectivity("timeout".into()).into();
        assert_eq!(e.kind(), "connectivity");
    }

    #[test]
    fn test_pipeline_error_display() {
        let result: Result<(), StorageError> = Err(StorageError::NotFound("model.json".into()));
        let err = result.in_stage(Stage::Push, "uploading model").unwrap_err();
        assert_eq!(err.stage, Stage::Push);
        let text = err.to_string();
        assert!(text.starts_with("push stage failed while uploading model"));
        assert!(text.contains("model.json"));
    }
}
