use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RunStoreError;

/// State key holding the accuracy of the last promoted model.
pub const EXPECTED_ACCURACY_KEY: &str = "expected_accuracy";

/// One finished pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    /// Timestamp keying the run's artifact directory and archive prefixes.
    pub run_timestamp: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Outcome label, or "error" for runs that aborted.
    pub outcome: String,
    /// Validation failures, rejection reason, or the error text.
    pub message: Option<String>,
    pub challenger_accuracy: Option<f64>,
    pub champion_accuracy: Option<f64>,
    pub accuracy_delta: Option<f64>,
    /// SHA-256 of the trained bundle, when one was written.
    pub model_fingerprint: Option<String>,
}

/// A persisted state value and its write count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: String,
    pub value: Value,
    /// Starts at 1 and increases by one on every write.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Storage for run history and versioned state.
pub trait RunStore: Send + Sync {
    /// Append a finished run.
    fn record_run(&self, record: &RunRecord) -> Result<(), RunStoreError>;

    /// Most recent runs first.
    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, RunStoreError>;

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, RunStoreError>;

    fn get_state(&self, key: &str) -> Result<Option<StateEntry>, RunStoreError>;

    /// Write `value` under `key`, bumping its version.
    fn put_state(&self, key: &str, value: &Value) -> Result<StateEntry, RunStoreError>;
}
