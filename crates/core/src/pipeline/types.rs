use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::artifact::{
    EvaluationArtifact, IngestionArtifact, PusherArtifact, TrainerArtifact,
    TransformationArtifact, ValidationArtifact,
};
use crate::model::MetricRecord;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingest,
    Validate,
    Transform,
    Train,
    Evaluate,
    Push,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Push => "push",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run that did not error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Challenger beat the champion and now owns the active key.
    Promoted,
    /// Challenger trained fine but did not clear the acceptance threshold.
    NotAccepted,
    /// Ingested data failed the schema gate.
    ValidationHalted,
    /// Trained model scored below the accuracy floor.
    TrainingRejected,
}

impl RunOutcome {
    /// Whether the run counts as a success for the caller.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Promoted | Self::NotAccepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promoted => "promoted",
            Self::NotAccepted => "not_accepted",
            Self::ValidationHalted => "validation_halted",
            Self::TrainingRejected => "training_rejected",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_timestamp: String,
    pub outcome: RunOutcome,
    /// Validation failures or the floor rejection, when the run halted.
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ingestion: IngestionArtifact,
    pub validation: ValidationArtifact,
    pub transformation: Option<TransformationArtifact>,
    /// Scores of the trained model, including a rejected one.
    pub metrics: Option<MetricRecord>,
    pub trainer: Option<TrainerArtifact>,
    pub evaluation: Option<EvaluationArtifact>,
    pub pusher: Option<PusherArtifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Validate.to_string(), "validate");
        assert_eq!(serde_json::to_value(Stage::Push).unwrap(), "push");
    }

    #[test]
    fn test_outcome_success() {
        assert!(RunOutcome::Promoted.is_success());
        assert!(RunOutcome::NotAccepted.is_success());
        assert!(!RunOutcome::ValidationHalted.is_success());
        assert!(!RunOutcome::TrainingRejected.is_success());
        assert_eq!(
            serde_json::to_value(RunOutcome::TrainingRejected).unwrap(),
            "training_rejected"
        );
    }
}
