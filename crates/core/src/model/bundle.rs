//! Preprocessor and classifier persisted as one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ModelError;
use super::forest::RandomForest;
use super::metrics::MetricRecord;
use crate::dataset::{DataFrame, DatasetError};
use crate::transform::{target_vector, Preprocessor};

/// Version of the bundle layout written by this crate.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// A fitted preprocessor paired with the classifier trained on its output.
///
/// Predictions always go through the bundled preprocessor, so raw records
/// are normalized exactly as the training data was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Run that produced the bundle.
    pub run_timestamp: String,
    /// Held-out scores measured at training time.
    pub metrics: MetricRecord,
    pub preprocessor: Preprocessor,
    pub classifier: RandomForest,
}

impl ModelBundle {
    pub fn new(
        preprocessor: Preprocessor,
        classifier: RandomForest,
        metrics: MetricRecord,
        run_timestamp: &str,
    ) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            trained_at: Utc::now(),
            run_timestamp: run_timestamp.to_string(),
            metrics,
            preprocessor,
            classifier,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let bundle: ModelBundle =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Serialization(e.to_string()))?;
        if bundle.format_version != BUNDLE_FORMAT_VERSION {
            return Err(ModelError::Serialization(format!(
                "unsupported bundle format version {}",
                bundle.format_version
            )));
        }
        Ok(bundle)
    }

    /// Probability of class 1 for each raw row.
    pub fn predict_proba(&self, frame: &DataFrame) -> Result<Vec<f64>, ModelError> {
        let x = self.preprocessor.transform(frame)?;
        self.classifier.predict_proba(x.view())
    }

    /// Class label for each raw row.
    pub fn predict(&self, frame: &DataFrame) -> Result<Vec<i64>, ModelError> {
        let x = self.preprocessor.transform(frame)?;
        self.classifier.predict(x.view())
    }

    /// Label and class-1 probability for each raw row, preprocessing once.
    pub fn predict_with_proba(&self, frame: &DataFrame) -> Result<Vec<(i64, f64)>, ModelError> {
        Ok(self
            .predict_proba(frame)?
            .into_iter()
            .map(|p| (RandomForest::label(p), p))
            .collect())
    }

    /// Score against the target column carried by `frame`.
    pub fn score(&self, frame: &DataFrame) -> Result<MetricRecord, ModelError> {
        let target = frame
            .column(&self.preprocessor.target)
            .ok_or_else(|| DatasetError::MissingColumn(self.preprocessor.target.clone()))?;
        let y_true = target_vector(target)?;
        let y_pred = self.predict(frame)?;
        Ok(MetricRecord::score(&y_true, &y_pred))
    }
}

/// Hex SHA-256 of serialized bundle bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
