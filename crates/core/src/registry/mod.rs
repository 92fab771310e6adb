//! Model registry: the single active champion key plus run archives.
//!
//! The active key is overwritten without locking or compare-and-swap; two
//! runs promoting at the same time race and the last writer wins.

mod config;
mod error;
mod predictor;
mod pusher;
mod registry;

pub use config::RegistryConfig;
pub use error::{PredictError, RegistryError};
pub use predictor::Predictor;
pub use pusher::RegistryPusher;
pub use registry::ModelRegistry;
