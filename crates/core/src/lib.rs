pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod ingestion;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod source;
pub mod state;
pub mod storage;
pub mod testing;
pub mod trainer;
pub mod transform;
pub mod validation;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use error::{PipelineError, StageError};
pub use pipeline::{RunOutcome, RunReport, Stage, TrainingPipeline};
pub use registry::{ModelRegistry, PredictError, Predictor};
pub use schema::{load_schema, Schema};
pub use source::{JsonDocumentSource, SourceConnector};
pub use state::{RunStore, SqliteRunStore};
pub use storage::{FsObjectStore, ObjectStore};
