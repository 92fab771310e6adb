//! Document source backed by JSON collection dumps on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::config::SourceConfig;
use super::error::SourceError;
use super::traits::{Record, SourceConnector};

/// Reads collections exported as JSON.
///
/// The root is either a single dump file or a directory laid out as
/// `<root>/<database>/<collection>.json` (or `.jsonl`). A dump is a JSON
/// array of documents or one document per line.
#[derive(Debug, Clone)]
pub struct JsonDocumentSource {
    root: PathBuf,
}

impl JsonDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build from configuration, reading the connection URL from the process
    /// environment when no explicit path is configured.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    /// Build from configuration with an explicit environment lookup.
    pub fn from_config_with_env<F>(config: &SourceConfig, lookup: F) -> Result<Self, SourceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &config.path {
            return Ok(Self::new(path.clone()));
        }

        let url = lookup(&config.connection_url_env)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                SourceError::Configuration(format!(
                    "Environment key: {} is not set.",
                    config.connection_url_env
                ))
            })?;

        match url.strip_prefix("file://") {
            Some(path) => Ok(Self::new(path)),
            None => Err(SourceError::Configuration(format!(
                "Connection URL in {} must use the file:// scheme",
                config.connection_url_env
            ))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, collection: &str, database: &str) -> Option<PathBuf> {
        if self.root.is_file() {
            return Some(self.root.clone());
        }
        [
            self.root.join(database).join(format!("{}.json", collection)),
            self.root.join(database).join(format!("{}.jsonl", collection)),
            self.root.join(format!("{}.json", collection)),
            self.root.join(format!("{}.jsonl", collection)),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

#[async_trait]
impl SourceConnector for JsonDocumentSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch_collection(
        &self,
        collection: &str,
        database: &str,
    ) -> Result<Vec<Record>, SourceError> {
        let path = self
            .resolve(collection, database)
            .ok_or_else(|| SourceError::CollectionNotFound {
                database: database.to_string(),
                collection: collection.to_string(),
            })?;

        debug!(path = %path.display(), "Reading collection dump");
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::CollectionNotFound {
                    database: database.to_string(),
                    collection: collection.to_string(),
                }
            } else {
                SourceError::Connectivity(format!("{}: {}", path.display(), e))
            }
        })?;

        let records = parse_documents(&content)?;
        info!(
            collection = %collection,
            database = %database,
            records = records.len(),
            "Fetched collection"
        );
        Ok(records)
    }
}

/// Decode a JSON array or JSON-lines dump into records.
pub(crate) fn parse_documents(content: &str) -> Result<Vec<Record>, SourceError> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<serde_json::Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| SourceError::Malformed(e.to_string()))?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .map_err(|e| SourceError::Malformed(format!("line {}: {}", n + 1, e)))
            })
            .collect::<Result<_, _>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(SourceError::Malformed(format!(
                "document {} is not an object: {}",
                i, other
            ))),
        })
        .collect()
}
