//! Model training and the static accuracy floor.

mod config;
mod trainer;

pub use crate::model::Criterion;
pub use config::TrainerConfig;
pub use trainer::{ModelTrainer, TrainerOutcome};
