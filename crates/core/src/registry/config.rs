use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Registry store location and key naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root directory of the filesystem object store.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Key holding the active model bundle.
    #[serde(default = "default_model_key")]
    pub model_key: String,

    /// Prefix for archived run artifacts, followed by the run timestamp.
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,

    /// Prefix for archived run logs, followed by the run timestamp.
    #[serde(default = "default_logs_prefix")]
    pub logs_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket: default_bucket(),
            model_key: default_model_key(),
            artifact_prefix: default_artifact_prefix(),
            logs_prefix: default_logs_prefix(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("registry")
}

fn default_bucket() -> String {
    "mlgate-models".to_string()
}

fn default_model_key() -> String {
    "model.json".to_string()
}

fn default_artifact_prefix() -> String {
    "artifacts".to_string()
}

fn default_logs_prefix() -> String {
    "logs".to_string()
}
