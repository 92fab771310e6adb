//! Training pipeline runner.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};

use super::types::{RunOutcome, RunReport, Stage};
use crate::artifact::RunLayout;
use crate::config::Config;
use crate::error::{PipelineError, StageContext};
use crate::evaluation::ModelEvaluation;
use crate::ingestion::DataIngestion;
use crate::metrics;
use crate::registry::{ModelRegistry, RegistryPusher};
use crate::schema::Schema;
use crate::source::SourceConnector;
use crate::state::{RunRecord, RunStore, EXPECTED_ACCURACY_KEY};
use crate::storage::ObjectStore;
use crate::trainer::{ModelTrainer, TrainerOutcome};
use crate::transform::DataTransformation;
use crate::validation::DataValidation;

/// Runs the full training pipeline against one source and one registry.
///
/// Connection handles are built once by the caller and shared by every run.
pub struct TrainingPipeline {
    config: Config,
    schema: Schema,
    source: Arc<dyn SourceConnector>,
    registry: ModelRegistry,
    run_store: Option<Arc<dyn RunStore>>,
}

impl TrainingPipeline {
    pub fn new(
        config: Config,
        schema: Schema,
        source: Arc<dyn SourceConnector>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let registry = ModelRegistry::new(store, &config.registry);
        Self {
            config,
            schema,
            source,
            registry,
            run_store: None,
        }
    }

    /// Record run history and read/write persisted state through `store`.
    pub fn with_run_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.run_store = Some(store);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Execute one run from ingestion to push.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_timestamp = self.config.pipeline.resolve_timestamp();
        let started_at = Utc::now();
        let layout = RunLayout::new(&self.config.pipeline.artifact_dir, &run_timestamp);

        let span = info_span!("run", run_id = %run_id, ts = %run_timestamp);
        let result = self
            .execute(&run_id, &layout, started_at)
            .instrument(span)
            .await;

        match &result {
            Ok(report) => {
                metrics::RUNS_TOTAL
                    .with_label_values(&[report.outcome.as_str()])
                    .inc();
                info!(
                    run_id = %run_id,
                    outcome = %report.outcome,
                    "Training run finished"
                );
                self.record(RunRecord {
                    run_id: run_id.clone(),
                    run_timestamp: run_timestamp.clone(),
                    started_at,
                    finished_at: report.finished_at,
                    outcome: report.outcome.as_str().to_string(),
                    message: report.message.clone(),
                    challenger_accuracy: report.metrics.map(|m| m.accuracy),
                    champion_accuracy: report
                        .evaluation
                        .as_ref()
                        .and_then(|e| e.champion_accuracy),
                    accuracy_delta: report.evaluation.as_ref().map(|e| e.accuracy_delta),
                    model_fingerprint: report.trainer.as_ref().map(|t| t.fingerprint.clone()),
                });
            }
            Err(e) => {
                metrics::RUNS_TOTAL.with_label_values(&["error"]).inc();
                error!(run_id = %run_id, stage = %e.stage, error = %e, "Training run failed");
                self.record(RunRecord {
                    run_id: run_id.clone(),
                    run_timestamp: run_timestamp.clone(),
                    started_at,
                    finished_at: Utc::now(),
                    outcome: "error".to_string(),
                    message: Some(e.to_string()),
                    challenger_accuracy: None,
                    champion_accuracy: None,
                    accuracy_delta: None,
                    model_fingerprint: None,
                });
            }
        }
        result
    }

    async fn execute(
        &self,
        run_id: &str,
        layout: &RunLayout,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<RunReport, PipelineError> {
        info!(artifact_root = %layout.root().display(), "Starting training run");

        // Ingest
        let ingestion = {
            let _timer = stage_timer(Stage::Ingest);
            DataIngestion::new(&self.config.ingestion, &self.config.source)
                .run(self.source.as_ref(), layout)
                .instrument(info_span!("stage", stage = %Stage::Ingest))
                .await
                .in_stage(Stage::Ingest, "exporting and splitting the source collection")?
        };

        // Validate
        let validation = {
            let _timer = stage_timer(Stage::Validate);
            let _span = info_span!("stage", stage = %Stage::Validate).entered();
            DataValidation::new(&self.schema)
                .run(&ingestion, layout)
                .in_stage(Stage::Validate, "checking partitions against the schema")?
        };

        let mut report = RunReport {
            run_id: run_id.to_string(),
            run_timestamp: layout.timestamp().to_string(),
            outcome: RunOutcome::ValidationHalted,
            message: None,
            started_at,
            finished_at: started_at,
            ingestion: ingestion.clone(),
            validation: validation.clone(),
            transformation: None,
            metrics: None,
            trainer: None,
            evaluation: None,
            pusher: None,
        };

        if !validation.status {
            warn!(message = %validation.message, "Validation gate halted the run");
            report.message = Some(validation.message.clone());
            return Ok(finish(report, RunOutcome::ValidationHalted));
        }

        // Transform
        let transformation = {
            let _timer = stage_timer(Stage::Transform);
            let _span = info_span!("stage", stage = %Stage::Transform).entered();
            DataTransformation::new(&self.schema, &self.config.transformation)
                .run(&ingestion, layout)
                .in_stage(Stage::Transform, "fitting and applying the preprocessor")?
        };
        report.transformation = Some(transformation.clone());

        // Train
        let trainer_outcome = {
            let expected = self
                .expected_accuracy()
                .in_stage(Stage::Train, "reading the expected accuracy")?;
            let _timer = stage_timer(Stage::Train);
            let _span = info_span!("stage", stage = %Stage::Train).entered();
            let trainer = ModelTrainer::new(&self.config.trainer);
            let floor = trainer.effective_floor(expected);
            trainer
                .run(&transformation, layout, floor)
                .in_stage(Stage::Train, "fitting the classifier")?
        };
        let trained = match trainer_outcome {
            TrainerOutcome::Trained(artifact) => artifact,
            TrainerOutcome::Rejected { metrics, floor } => {
                report.metrics = Some(metrics);
                report.message = Some(format!(
                    "Model accuracy {:.4} is below the floor {:.4}",
                    metrics.accuracy, floor
                ));
                return Ok(finish(report, RunOutcome::TrainingRejected));
            }
        };
        report.metrics = Some(trained.metrics);
        report.trainer = Some(trained.clone());

        // Evaluate
        let evaluation = {
            let _timer = stage_timer(Stage::Evaluate);
            ModelEvaluation::new(&self.config.evaluation, &self.registry)
                .run(&ingestion, &trained)
                .instrument(info_span!("stage", stage = %Stage::Evaluate))
                .await
                .in_stage(Stage::Evaluate, "scoring the champion")?
        };
        report.evaluation = Some(evaluation.clone());

        if !evaluation.accepted {
            info!(
                delta = evaluation.accuracy_delta,
                "Challenger not accepted; champion stays active"
            );
            if let Some(champion) = evaluation.champion_accuracy {
                metrics::CHAMPION_ACCURACY.set(champion);
            }
            return Ok(finish(report, RunOutcome::NotAccepted));
        }

        // Push
        let pusher = {
            let _timer = stage_timer(Stage::Push);
            RegistryPusher::new(&self.registry, &self.config.registry)
                .push(
                    &trained,
                    layout.root(),
                    &self.config.pipeline.logs_dir,
                    layout.timestamp(),
                )
                .instrument(info_span!("stage", stage = %Stage::Push))
                .await
                .in_stage(Stage::Push, "uploading artifacts and promoting the model")?
        };
        report.pusher = Some(pusher);
        metrics::CHAMPION_ACCURACY.set(trained.metrics.accuracy);

        if let Some(store) = &self.run_store {
            store
                .put_state(
                    EXPECTED_ACCURACY_KEY,
                    &serde_json::json!(trained.metrics.accuracy),
                )
                .in_stage(Stage::Push, "recording the expected accuracy")?;
        }

        Ok(finish(report, RunOutcome::Promoted))
    }

    /// Accuracy of the last promoted model, if recorded.
    fn expected_accuracy(&self) -> Result<Option<f64>, crate::state::RunStoreError> {
        match &self.run_store {
            Some(store) => Ok(store
                .get_state(EXPECTED_ACCURACY_KEY)?
                .and_then(|entry| entry.value.as_f64())),
            None => Ok(None),
        }
    }

    fn record(&self, record: RunRecord) {
        if let Some(store) = &self.run_store {
            if let Err(e) = store.record_run(&record) {
                warn!(run_id = %record.run_id, error = %e, "Failed to record run history");
            }
        }
    }
}

fn stage_timer(stage: Stage) -> prometheus::HistogramTimer {
    metrics::STAGE_DURATION
        .with_label_values(&[stage.as_str()])
        .start_timer()
}

fn finish(mut report: RunReport, outcome: RunOutcome) -> RunReport {
    report.outcome = outcome;
    report.finished_at = Utc::now();
    report
}
