//! In-memory object store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{validate_key, ObjectStore, StorageError};

/// A successful write, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub key: String,
    pub size: usize,
}

/// Mock implementation of the ObjectStore trait backed by a map.
///
/// Records successful puts so tests can assert write order, and can fail
/// the next operation of any kind.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    puts: Arc<RwLock<Vec<RecordedPut>>>,
    /// If set, the next operation fails with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored key, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn recorded_puts(&self) -> Vec<RecordedPut> {
        self.puts.read().await.clone()
    }

    /// Fail the next operation with `error`.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    async fn check(&self, key: &str) -> Result<(), StorageError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        validate_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.check(key).await?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check(key).await?;
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.check(key).await?;
        let size = bytes.len();
        self.objects.write().await.insert(key.to_string(), bytes);
        self.puts.write().await.push(RecordedPut {
            key: key.to_string(),
            size,
        });
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_list() {
        let store = MemoryObjectStore::new();
        store.put("b/2", b"two".to_vec()).await.unwrap();
        store.put("a/1", b"one".to_vec()).await.unwrap();

        assert_eq!(store.get("a/1").await.unwrap(), b"one");
        assert_eq!(store.list("").await.unwrap(), vec!["a/1", "b/2"]);
        assert_eq!(store.list("b/").await.unwrap(), vec!["b/2"]);
        assert_eq!(store.recorded_puts().await[0].key, "b/2");
        assert!(matches!(
            store.get("missing").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_next_error_is_consumed_once() {
        let store = MemoryObjectStore::new();
        store
            .set_next_error(StorageError::Connectivity("down".into()))
            .await;
        assert!(store.put("k", vec![1]).await.is_err());
        assert!(store.put("k", vec![1]).await.is_ok());
        assert_eq!(store.recorded_puts().await.len(), 1);
    }
}
