//! Stage artifacts and the per-run directory layout.
//!
//! Stages exchange data only through these records and the files they point
//! at; no stage reaches into another stage's in-memory state.

mod json;
mod layout;
mod types;

pub use json::{read_json, write_json};
pub use layout::RunLayout;
pub use types::{
    EvaluationArtifact, IngestionArtifact, PusherArtifact, TrainerArtifact,
    TransformationArtifact, ValidationArtifact,
};
