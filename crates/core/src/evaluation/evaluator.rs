use tracing::{info, warn};

use super::config::EvaluationConfig;
use crate::artifact::{EvaluationArtifact, IngestionArtifact, TrainerArtifact};
use crate::dataset::read_csv;
use crate::error::StageError;
use crate::registry::ModelRegistry;

/// Acceptance rule: `delta = challenger - champion` (champion 0 when absent),
/// accepted iff `delta > threshold`.
pub fn decide(challenger_accuracy: f64, champion_accuracy: Option<f64>, threshold: f64) -> (bool, f64) {
    let delta = challenger_accuracy - champion_accuracy.unwrap_or(0.0);
    (delta > threshold, delta)
}

/// Scores the registry champion on this run's test split and compares.
pub struct ModelEvaluation<'a> {
    config: &'a EvaluationConfig,
    registry: &'a ModelRegistry,
}

impl<'a> ModelEvaluation<'a> {
    pub fn new(config: &'a EvaluationConfig, registry: &'a ModelRegistry) -> Self {
        Self { config, registry }
    }

    /// Decide whether the challenger should replace the champion.
    ///
    /// The champion is applied through its own bundled preprocessor to the
    /// raw test partition the challenger was scored on. Only an empty
    /// registry counts as a zero baseline; a champion that cannot score the
    /// partition fails the stage.
    pub async fn run(
        &self,
        ingestion: &IngestionArtifact,
        trainer: &TrainerArtifact,
    ) -> Result<EvaluationArtifact, StageError> {
        let champion = self.registry.load_champion().await?;

        let champion_accuracy = match &champion {
            None => {
                info!("No champion in registry");
                None
            }
            Some(bundle) => {
                let test = read_csv(&ingestion.test_path)?;
                let metrics = bundle.score(&test).inspect_err(|e| {
                    warn!(error = %e, "Champion cannot score the current test split");
                })?;
                Some(metrics.accuracy)
            }
        };

        let challenger_accuracy = trainer.metrics.accuracy;
        let (accepted, accuracy_delta) = decide(
            challenger_accuracy,
            champion_accuracy,
            self.config.acceptance_threshold,
        );
        info!(
            challenger = challenger_accuracy,
            champion = ?champion_accuracy,
            delta = accuracy_delta,
            threshold = self.config.acceptance_threshold,
            accepted,
            "Evaluated challenger"
        );

        Ok(EvaluationArtifact {
            accepted,
            accuracy_delta,
            challenger_accuracy,
            champion_accuracy,
            champion_path: champion.map(|_| self.registry.model_key().to_string()),
            challenger_path: trainer.bundle_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::RunLayout;
    use crate::model::MetricRecord;
    use crate::registry::RegistryConfig;
    use crate::testing::{fixtures, MemoryObjectStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_decide_against_champion() {
        let (accepted, delta) = decide(0.83, Some(0.80), 0.02);
        assert!(accepted);
        assert!((delta - 0.03).abs() < 1e-9);

        let (accepted, _) = decide(0.83, Some(0.80), 0.05);
        assert!(!accepted);
    }

    #[test]
    fn test_decide_without_champion() {
        assert_eq!(decide(0.7, None, 0.02), (true, 0.7));
        assert_eq!(decide(0.01, None, 0.02).0, false);
    }

    #[test]
    fn test_tie_does_not_promote() {
        let (accepted, delta) = decide(0.5, Some(0.25), 0.25);
        assert_eq!(delta, 0.25);
        assert!(!accepted);
    }

    fn trainer_artifact(accuracy: f64) -> TrainerArtifact {
        TrainerArtifact {
            bundle_path: "model.json".into(),
            metrics: MetricRecord {
                accuracy,
                ..MetricRecord::default()
            },
            fingerprint: String::new(),
        }
    }

    #[tokio::test]
    async fn test_run_without_champion() {
        let store = Arc::new(MemoryObjectStore::new());
        let registry = ModelRegistry::new(store, &RegistryConfig::default());
        let config = EvaluationConfig::default();
        let ingestion = IngestionArtifact {
            feature_store_path: "unused".into(),
            train_path: "unused".into(),
            test_path: "unused".into(),
            train_rows: 0,
            test_rows: 0,
        };

        let artifact = ModelEvaluation::new(&config, &registry)
            .run(&ingestion, &trainer_artifact(0.7))
            .await
            .unwrap();
        assert!(artifact.accepted);
        assert_eq!(artifact.champion_accuracy, None);
        assert_eq!(artifact.champion_path, None);
    }

    #[tokio::test]
    async fn test_run_scores_champion_on_current_test_split() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let ingestion = fixtures::ingestion_artifact(&layout, 120, 40, 31);

        let store = Arc::new(MemoryObjectStore::new());
        let registry = ModelRegistry::new(store, &RegistryConfig::default());
        let champion = fixtures::trained_bundle(120, 32);
        registry.promote(champion.to_bytes().unwrap()).await.unwrap();

        let config = EvaluationConfig::default();
        let evaluation = ModelEvaluation::new(&config, &registry);
        let first = evaluation.run(&ingestion, &trainer_artifact(0.99)).await.unwrap();
        let second = evaluation.run(&ingestion, &trainer_artifact(0.99)).await.unwrap();

        let champion_accuracy = first.champion_accuracy.unwrap();
        assert!(champion_accuracy > 0.0);
        assert_eq!(first.champion_path.as_deref(), Some("model.json"));
        assert!((first.accuracy_delta - (0.99 - champion_accuracy)).abs() < 1e-12);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreadable_champion_fails_the_stage() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let ingestion = fixtures::ingestion_artifact(&layout, 120, 40, 31);

        let store = Arc::new(MemoryObjectStore::new());
        let registry = ModelRegistry::new(store, &RegistryConfig::default());
        let mut champion = fixtures::trained_bundle(120, 32);
        champion.preprocessor.encoder.categories[0].column = "Gender_Renamed".to_string();
        registry.promote(champion.to_bytes().unwrap()).await.unwrap();

        let config = EvaluationConfig::default();
        let result = ModelEvaluation::new(&config, &registry)
            .run(&ingestion, &trainer_artifact(0.05))
            .await;

        match result {
            Err(StageError::Data(message)) => assert!(message.contains("Gender_Renamed")),
            other => panic!("expected a data error, got {other:?}"),
        }
    }
}
