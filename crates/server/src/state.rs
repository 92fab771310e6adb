use std::sync::Arc;

use tokio::sync::Mutex;

use mlgate_core::{Predictor, RunStore, SanitizedConfig, TrainingPipeline};

/// Shared application state
pub struct AppState {
    pipeline: TrainingPipeline,
    run_store: Arc<dyn RunStore>,
    predictor: Predictor,
    /// Held for the duration of a training run.
    train_lock: Mutex<()>,
}

impl AppState {
    /// The pipeline must already be wired to `run_store`.
    pub fn new(pipeline: TrainingPipeline, run_store: Arc<dyn RunStore>) -> Self {
        let predictor = Predictor::new(pipeline.registry().clone());
        Self {
            pipeline,
            run_store,
            predictor,
            train_lock: Mutex::new(()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.pipeline.config())
    }

    pub fn pipeline(&self) -> &TrainingPipeline {
        &self.pipeline
    }

    pub fn run_store(&self) -> &dyn RunStore {
        self.run_store.as_ref()
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn train_lock(&self) -> &Mutex<()> {
        &self.train_lock
    }
}
