use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::error::PredictError;
use super::registry::ModelRegistry;
use crate::dataset::DataFrame;
use crate::model::ModelBundle;

/// Serving-side access to the champion, cached after the first load.
pub struct Predictor {
    registry: ModelRegistry,
    cached: RwLock<Option<Arc<ModelBundle>>>,
}

impl Predictor {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            cached: RwLock::new(None),
        }
    }

    /// The cached champion, loading it from the registry on first use.
    pub async fn champion(&self) -> Result<Arc<ModelBundle>, PredictError> {
        if let Some(bundle) = self.cached.read().await.as_ref() {
            return Ok(bundle.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(bundle) = cached.as_ref() {
            return Ok(bundle.clone());
        }
        let bundle = Arc::new(
            self.registry
                .load_champion()
                .await?
                .ok_or(PredictError::NoChampion)?,
        );
        info!(trained_at = %bundle.trained_at, "Loaded champion for serving");
        *cached = Some(bundle.clone());
        Ok(bundle)
    }

    /// Drop the cached champion so the next call reloads it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Class label and positive-class probability for each row.
    pub async fn predict(&self, frame: &DataFrame) -> Result<Vec<(i64, f64)>, PredictError> {
        let bundle = self.champion().await?;
        Ok(bundle.predict_with_proba(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;
    use crate::testing::{fixtures, MemoryObjectStore};

    #[tokio::test]
    async fn test_no_champion() {
        let registry = ModelRegistry::new(
            Arc::new(MemoryObjectStore::new()),
            &RegistryConfig::default(),
        );
        let predictor = Predictor::new(registry);
        let frame = fixtures::insurance_frame(1, 1);
        assert!(matches!(
            predictor.predict(&frame).await,
            Err(PredictError::NoChampion)
        ));
    }

    #[tokio::test]
    async fn test_caches_until_invalidated() {
        let store = Arc::new(MemoryObjectStore::new());
        let registry = ModelRegistry::new(store.clone(), &RegistryConfig::default());
        let first = fixtures::trained_bundle(60, 1);
        registry.promote(first.to_bytes().unwrap()).await.unwrap();

        let predictor = Predictor::new(registry.clone());
        let frame = fixtures::insurance_frame(3, 2);
        assert_eq!(predictor.predict(&frame).await.unwrap().len(), 3);

        let second = fixtures::trained_bundle(60, 2);
        registry.promote(second.to_bytes().unwrap()).await.unwrap();
        assert_eq!(*predictor.champion().await.unwrap(), first);

        predictor.invalidate().await;
        assert_eq!(*predictor.champion().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_predictions_pair_label_with_probability() {
        let store = Arc::new(MemoryObjectStore::new());
        let registry = ModelRegistry::new(store, &RegistryConfig::default());
        let bundle = fixtures::trained_bundle(80, 4);
        registry.promote(bundle.to_bytes().unwrap()).await.unwrap();

        let frame = fixtures::insurance_frame(12, 9);
        let predictions = Predictor::new(registry).predict(&frame).await.unwrap();

        assert_eq!(predictions.len(), 12);
        assert_eq!(predictions, bundle.predict_with_proba(&frame).unwrap());
        assert!(predictions
            .iter()
            .all(|&(label, p)| label == i64::from(p > 0.5)));
    }
}
