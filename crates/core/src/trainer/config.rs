use serde::{Deserialize, Serialize};

use crate::model::{Criterion, ForestParams};

/// Classifier hyperparameters and the minimum acceptable accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_criterion")]
    pub criterion: Criterion,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Models scoring below this test accuracy are rejected.
    #[serde(default = "default_accuracy_floor")]
    pub accuracy_floor: f64,

    /// Raise the floor to the last promoted model's accuracy.
    #[serde(default)]
    pub ratchet_floor: bool,
}

impl TrainerConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            criterion: self.criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            random_seed: self.random_seed,
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            criterion: default_criterion(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_depth: default_max_depth(),
            random_seed: default_random_seed(),
            accuracy_floor: default_accuracy_floor(),
            ratchet_floor: false,
        }
    }
}

fn default_n_estimators() -> usize {
    200
}

fn default_criterion() -> Criterion {
    Criterion::Entropy
}

fn default_min_samples_split() -> usize {
    7
}

fn default_min_samples_leaf() -> usize {
    6
}

fn default_max_depth() -> usize {
    10
}

fn default_random_seed() -> u64 {
    101
}

fn default_accuracy_floor() -> f64 {
    0.6
}
