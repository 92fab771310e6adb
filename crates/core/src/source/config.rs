//! Configuration for the source connector.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Source collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database holding the collection.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection to read.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Environment variable that carries the connection URL.
    #[serde(default = "default_connection_url_env")]
    pub connection_url_env: String,

    /// Local document dump. Takes precedence over the connection URL.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Retry policy for transient read failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            collection: default_collection(),
            connection_url_env: default_connection_url_env(),
            path: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_database() -> String {
    "Vehicle-Insurance-Proj".to_string()
}

fn default_collection() -> String {
    "Vehicle_Insurance_Data".to_string()
}

fn default_connection_url_env() -> String {
    "MONGODB_CONNECTION_URL".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    2000
}
