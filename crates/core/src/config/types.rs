use chrono::Local;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::evaluation::EvaluationConfig;
use crate::ingestion::IngestionConfig;
use crate::registry::RegistryConfig;
use crate::source::SourceConfig;
use crate::trainer::TrainerConfig;
use crate::transform::TransformationConfig;

/// Format used for run timestamps (artifact directories and archive prefixes).
pub const RUN_TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H_%M_%S";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub transformation: TransformationConfig,
    #[serde(default)]
    pub trainer: TrainerConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Run-level layout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Root directory for per-run artifact trees.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Directory holding run log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Path to the YAML schema document.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
    /// Fixed run timestamp. When unset, each run stamps itself with local time.
    #[serde(default)]
    pub run_timestamp: Option<String>,
}

impl PipelineConfig {
    /// Timestamp used to key this run's artifact directory and archive prefixes.
    pub fn resolve_timestamp(&self) -> String {
        self.run_timestamp
            .clone()
            .unwrap_or_else(|| Local::now().format(RUN_TIMESTAMP_FORMAT).to_string())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            logs_dir: default_logs_dir(),
            schema_path: default_schema_path(),
            run_timestamp: None,
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifact")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("config/schema.yaml")
}

/// Run history / persisted state database.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("mlgate.db")
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (no resolved secrets)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub pipeline: PipelineConfig,
    pub source: SanitizedSourceConfig,
    pub ingestion: IngestionConfig,
    pub transformation: TransformationConfig,
    pub trainer: TrainerConfig,
    pub evaluation: EvaluationConfig,
    pub registry: RegistryConfig,
    pub server: ServerConfig,
}

/// Source config with the connection string reduced to a presence flag.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub database: String,
    pub collection: String,
    pub connection_url_env: String,
    pub connection_url_configured: bool,
    pub path: Option<PathBuf>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            source: SanitizedSourceConfig {
                database: config.source.database.clone(),
                collection: config.source.collection.clone(),
                connection_url_env: config.source.connection_url_env.clone(),
                connection_url_configured: std::env::var(&config.source.connection_url_env)
                    .map(|v| !v.is_empty())
                    .unwrap_or(false),
                path: config.source.path.clone(),
            },
            ingestion: config.ingestion.clone(),
            transformation: config.transformation.clone(),
            trainer: config.trainer.clone(),
            evaluation: config.evaluation.clone(),
            registry: config.registry.clone(),
            server: config.server.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::Criterion;

    #[test]
    fn test_deserialize_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.artifact_dir, PathBuf::from("artifact"));
        assert_eq!(
            config.pipeline.schema_path,
            PathBuf::from("config/schema.yaml")
        );
        assert_eq!(config.source.collection, "Vehicle_Insurance_Data");
        assert_eq!(config.trainer.criterion, Criterion::Entropy);
        assert_eq!(config.trainer.min_samples_split, 7);
        assert_eq!(config.trainer.min_samples_leaf, 6);
        assert_eq!(config.trainer.random_seed, 101);
        assert_eq!(config.registry.model_key, "model.json");
        assert_eq!(config.state.path, PathBuf::from("mlgate.db"));
    }

    #[test]
    fn test_deserialize_full_sections() {
        let toml = r#"
[pipeline]
artifact_dir = "/tmp/artifacts"
run_timestamp = "01_01_2026_00_00_00"

[ingestion]
test_ratio = 0.3
random_seed = 7

[trainer]
criterion = "gini"
n_estimators = 50
ratchet_floor = true

[evaluation]
acceptance_threshold = 0.05

[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ingestion.test_ratio, 0.3);
        assert_eq!(config.ingestion.random_seed, 7);
        assert_eq!(config.trainer.criterion, Criterion::Gini);
        assert_eq!(config.trainer.n_estimators, 50);
        assert!(config.trainer.ratchet_floor);
        assert_eq!(config.evaluation.acceptance_threshold, 0.05);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.pipeline.resolve_timestamp(),
            "01_01_2026_00_00_00"
        );
    }

    #[test]
    fn test_generated_timestamp_format() {
        let ts = PipelineConfig::default().resolve_timestamp();
        // dd_mm_YYYY_HH_MM_SS
        assert_eq!(ts.len(), 19);
        assert_eq!(ts.matches('_').count(), 5);
    }

    #[test]
    fn test_sanitized_config_hides_connection_url() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(json.contains("connection_url_configured"));
        assert_eq!(sanitized.source.connection_url_env, "MONGODB_CONNECTION_URL");
    }
}
