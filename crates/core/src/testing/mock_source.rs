//! Mock source connector for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{Record, SourceConnector, SourceError};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub collection: String,
    pub database: String,
}

/// Mock implementation of the SourceConnector trait.
///
/// Serves a fixed document list, records every call, and can be told to
/// fail the next few fetches.
///
/// # Example
///
/// ```rust,ignore
/// use mlgate_core::testing::{fixtures, MockSource};
///
/// let source = MockSource::new();
/// source.set_documents(fixtures::insurance_documents(40, 1)).await;
/// source.fail_next(2).await;
///
/// let records = fetch_with_retry(&source, "coll", "db", &retry).await?;
/// assert_eq!(source.recorded_calls().await.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    documents: Arc<RwLock<Vec<Value>>>,
    calls: Arc<RwLock<Vec<RecordedFetch>>>,
    /// Number of upcoming fetches that fail with a connectivity error.
    failures_remaining: Arc<RwLock<u32>>,
    /// If set, the next fetch fails with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the documents returned by every fetch.
    pub async fn set_documents(&self, documents: Vec<Value>) {
        *self.documents.write().await = documents;
    }

    /// Fail the next `count` fetches with a transient error.
    pub async fn fail_next(&self, count: u32) {
        *self.failures_remaining.write().await = count;
    }

    /// Fail the next fetch with `error`.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedFetch> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl SourceConnector for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_collection(
        &self,
        collection: &str,
        database: &str,
    ) -> Result<Vec<Record>, SourceError> {
        self.calls.write().await.push(RecordedFetch {
            collection: collection.to_string(),
            database: database.to_string(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        {
            let mut remaining = self.failures_remaining.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SourceError::Connectivity("mock source unavailable".into()));
            }
        }

        self.documents
            .read()
            .await
            .iter()
            .map(|doc| match doc {
                Value::Object(map) => Ok(map.clone()),
                other => Err(SourceError::Malformed(format!(
                    "expected an object, got {}",
                    other
                ))),
            })
            .collect()
    }
}
