use serde::{Deserialize, Serialize};

/// Train/test split settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Fraction of rows held out for testing.
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Seed for the split shuffle.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            test_ratio: default_test_ratio(),
            random_seed: default_random_seed(),
        }
    }
}

fn default_test_ratio() -> f64 {
    0.25
}

fn default_random_seed() -> u64 {
    42
}
