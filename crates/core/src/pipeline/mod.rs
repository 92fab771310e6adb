//! End-to-end training run.
//!
//! Stages run strictly in order: ingest, validate, transform, train,
//! evaluate, push. Validation failure and sub-floor training halt the run;
//! a challenger that does not beat the champion ends it without a push.
//! None of these gates are errors. Anything else aborts the run with a
//! [`PipelineError`](crate::error::PipelineError).

mod runner;
mod types;

pub use runner::TrainingPipeline;
pub use types::{RunOutcome, RunReport, Stage};
