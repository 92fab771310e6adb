//! Bounded fixed-delay retry around collection reads.

use tracing::warn;

use super::config::RetryConfig;
use super::error::SourceError;
use super::traits::{Record, SourceConnector};
use crate::metrics;

/// Fetch a collection, retrying transient failures.
///
/// Only [`SourceError::Connectivity`] is retried; every other error is
/// returned on the first occurrence. After `max_attempts` the last
/// connectivity error is returned.
pub async fn fetch_with_retry(
    source: &dyn SourceConnector,
    collection: &str,
    database: &str,
    retry: &RetryConfig,
) -> Result<Vec<Record>, SourceError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch_collection(collection, database).await {
            Ok(records) => return Ok(records),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    source = source.name(),
                    attempt,
                    max_attempts,
                    error = %e,
                    "Transient source failure, retrying"
                );
                metrics::SOURCE_RETRIES.inc();
                tokio::time::sleep(retry.delay()).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSource;
    use serde_json::json;

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let source = MockSource::new();
        source.set_documents(vec![json!({"a": 1})]).await;
        source.fail_next(2).await;

        let records = fetch_with_retry(&source, "c", "db", &fast_retry(3))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.recorded_calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let source = MockSource::new();
        source.fail_next(5).await;

        let err = fetch_with_retry(&source, "c", "db", &fast_retry(3))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(source.recorded_calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_configuration_error_not_retried() {
        let source = MockSource::new();
        source
            .set_next_error(SourceError::Configuration("no url".into()))
            .await;

        let err = fetch_with_retry(&source, "c", "db", &fast_retry(3))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
        assert_eq!(source.recorded_calls().await.len(), 1);
    }
}
