use std::sync::Arc;
use tracing::{debug, info};

use super::config::RegistryConfig;
use super::error::RegistryError;
use crate::model::ModelBundle;
use crate::storage::{ObjectStore, StorageError};

/// Access to the active model key of the registry store.
#[derive(Clone)]
pub struct ModelRegistry {
    store: Arc<dyn ObjectStore>,
    model_key: String,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ObjectStore>, config: &RegistryConfig) -> Self {
        Self {
            store,
            model_key: config.model_key.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    pub async fn is_model_present(&self) -> Result<bool, RegistryError> {
        Ok(self.store.exists(&self.model_key).await?)
    }

    /// The current champion, or `None` if nothing was ever promoted.
    pub async fn load_champion(&self) -> Result<Option<ModelBundle>, RegistryError> {
        let bytes = match self.store.get(&self.model_key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bundle = ModelBundle::from_bytes(&bytes)?;
        debug!(
            key = %self.model_key,
            trained_at = %bundle.trained_at,
            "Loaded champion bundle"
        );
        Ok(Some(bundle))
    }

    /// Overwrite the active key with a new bundle.
    pub async fn promote(&self, bundle_bytes: Vec<u8>) -> Result<(), RegistryError> {
        let size = bundle_bytes.len();
        self.store.put(&self.model_key, bundle_bytes).await?;
        info!(key = %self.model_key, bytes = size, "Promoted model to registry");
        Ok(())
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("store", &self.store.name())
            .field("model_key", &self.model_key)
            .finish()
    }
}
