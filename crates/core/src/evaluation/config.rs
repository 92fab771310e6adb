use serde::{Deserialize, Serialize};

/// Promotion gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Minimum accuracy gain over the champion. The comparison is strict.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
        }
    }
}

fn default_acceptance_threshold() -> f64 {
    0.02
}
