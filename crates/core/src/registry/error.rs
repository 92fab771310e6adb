//! Error types for the registry and prediction path.

use thiserror::Error;

use crate::error::StageError;
use crate::model::ModelError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Champion bundle is unreadable: {0}")]
    Bundle(#[from] ModelError),

    /// Local artifact or log directory could not be read for archiving.
    #[error("Failed to read {path}: {source}")]
    LocalRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RegistryError> for StageError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Storage(inner) => inner.into(),
            RegistryError::Bundle(inner) => inner.into(),
            RegistryError::LocalRead { .. } => StageError::Persistence(e.to_string()),
        }
    }
}

/// Errors on the serving path.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The registry holds no model yet.
    #[error("No champion model in the registry")]
    NoChampion,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Input could not be run through the bundle.
    #[error("Prediction failed: {0}")]
    Model(#[from] ModelError),
}
