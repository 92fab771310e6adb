use tracing::{info, warn};

use super::config::TrainerConfig;
use crate::artifact::{read_json, RunLayout, TrainerArtifact, TransformationArtifact};
use crate::error::StageError;
use crate::model::{fingerprint, MetricRecord, ModelBundle, RandomForest};
use crate::transform::{Preprocessor, TransformedSplit};

/// Result of the training stage.
#[derive(Debug, Clone)]
pub enum TrainerOutcome {
    /// Model cleared the floor and its bundle was written.
    Trained(TrainerArtifact),
    /// Model scored below the floor. Nothing was written.
    Rejected { metrics: MetricRecord, floor: f64 },
}

/// Fits the classifier on transformed data.
pub struct ModelTrainer<'a> {
    config: &'a TrainerConfig,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(config: &'a TrainerConfig) -> Self {
        Self { config }
    }

    /// Floor in force for this run.
    ///
    /// With `ratchet_floor` the floor rises to the accuracy of the last
    /// promoted model; otherwise only the configured floor applies.
    pub fn effective_floor(&self, expected_accuracy: Option<f64>) -> f64 {
        match expected_accuracy {
            Some(expected) if self.config.ratchet_floor => self.config.accuracy_floor.max(expected),
            _ => self.config.accuracy_floor,
        }
    }

    /// Fit on the train split and score on the test split.
    pub fn train(
        &self,
        train: &TransformedSplit,
        test: &TransformedSplit,
    ) -> Result<(RandomForest, MetricRecord), StageError> {
        if train.feature_names != test.feature_names {
            return Err(StageError::Data(
                "train and test splits have different feature columns".to_string(),
            ));
        }
        let classifier = RandomForest::fit(
            train.features(),
            &train.targets(),
            &self.config.forest_params(),
        )?;
        let predicted = classifier.predict(test.features())?;
        let metrics = MetricRecord::score(&test.targets(), &predicted);
        Ok((classifier, metrics))
    }

    /// Train, apply the floor, and persist the bundle when it passes.
    pub fn run(
        &self,
        transformation: &TransformationArtifact,
        layout: &RunLayout,
        floor: f64,
    ) -> Result<TrainerOutcome, StageError> {
        let train: TransformedSplit = read_json(&transformation.transformed_train_path)?;
        let test: TransformedSplit = read_json(&transformation.transformed_test_path)?;
        let preprocessor: Preprocessor = read_json(&transformation.preprocessor_path)?;

        let (classifier, metrics) = self.train(&train, &test)?;
        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            "Scored trained model"
        );

        if metrics.accuracy < floor {
            warn!(
                accuracy = metrics.accuracy,
                floor, "Trained model is below the accuracy floor"
            );
            return Ok(TrainerOutcome::Rejected { metrics, floor });
        }

        let bundle = ModelBundle::new(preprocessor, classifier, metrics, layout.timestamp());
        let bytes = bundle.to_bytes()?;
        let bundle_path = layout.trained_model_file();
        if let Some(parent) = bundle_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&bundle_path, &bytes)?;

        Ok(TrainerOutcome::Trained(TrainerArtifact {
            bundle_path,
            metrics,
            fingerprint: fingerprint(&bytes),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    fn config() -> TrainerConfig {
        TrainerConfig {
            n_estimators: 15,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_effective_floor() {
        let mut cfg = config();
        let trainer = ModelTrainer::new(&cfg);
        assert_eq!(trainer.effective_floor(Some(0.9)), 0.6);
        assert_eq!(trainer.effective_floor(None), 0.6);

        cfg.ratchet_floor = true;
        let trainer = ModelTrainer::new(&cfg);
        assert_eq!(trainer.effective_floor(Some(0.9)), 0.9);
        assert_eq!(trainer.effective_floor(Some(0.5)), 0.6);
    }

    #[test]
    fn test_run_writes_bundle_when_above_floor() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let artifact = fixtures::transformation_artifact(&layout, 160, 21);

        let cfg = config();
        let outcome = ModelTrainer::new(&cfg).run(&artifact, &layout, 0.6).unwrap();
        match outcome {
            TrainerOutcome::Trained(trained) => {
                assert!(trained.bundle_path.is_file());
                assert!(trained.metrics.accuracy >= 0.6);
                let bytes = std::fs::read(&trained.bundle_path).unwrap();
                assert_eq!(fingerprint(&bytes), trained.fingerprint);
            }
            other => panic!("expected a trained model, got {:?}", other),
        }
    }

    #[test]
    fn test_run_below_floor_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let artifact = fixtures::transformation_artifact(&layout, 160, 21);

        let cfg = config();
        let outcome = ModelTrainer::new(&cfg).run(&artifact, &layout, 1.01).unwrap();
        assert!(matches!(outcome, TrainerOutcome::Rejected { floor, .. } if floor == 1.01));
        assert!(!layout.trained_model_file().exists());
    }
}
