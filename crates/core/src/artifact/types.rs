use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::MetricRecord;

/// Output of ingestion: the raw export and the two partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionArtifact {
    pub feature_store_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Output of the schema gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationArtifact {
    pub status: bool,
    /// Newline-joined failure descriptions; empty when `status` is true.
    pub message: String,
    pub report_path: PathBuf,
}

/// Output of transformation: the fitted preprocessor and both arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationArtifact {
    pub preprocessor_path: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Output of a successful training stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerArtifact {
    pub bundle_path: PathBuf,
    pub metrics: MetricRecord,
    /// SHA-256 of the serialized bundle.
    pub fingerprint: String,
}

/// Champion/challenger decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationArtifact {
    pub accepted: bool,
    pub accuracy_delta: f64,
    pub challenger_accuracy: f64,
    /// `None` when the registry held no champion.
    pub champion_accuracy: Option<f64>,
    /// Registry key the champion was read from, if one existed.
    pub champion_path: Option<String>,
    pub challenger_path: PathBuf,
}

/// Output of a registry push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherArtifact {
    pub bucket: String,
    pub model_key: String,
    /// Timestamp the archives were written under, suffixed when the run's
    /// own timestamp was already taken.
    pub archive_id: String,
    /// Archive keys written before the active key was replaced.
    pub archived_keys: Vec<String>,
}
