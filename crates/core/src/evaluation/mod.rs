//! Champion/challenger comparison.

mod config;
mod evaluator;

pub use config::EvaluationConfig;
pub use evaluator::{decide, ModelEvaluation};
