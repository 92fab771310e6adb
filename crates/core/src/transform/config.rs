use serde::{Deserialize, Serialize};

/// How strictly edited nearest neighbours removes majority samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnnSelection {
    /// Keep a sample only if every neighbour shares its class.
    All,
    /// Keep a sample if most neighbours share its class.
    Mode,
}

/// Resampling settings. Scaler column lists live in the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationConfig {
    /// Neighbours used to synthesize minority samples.
    #[serde(default = "default_smote_k")]
    pub smote_k_neighbors: usize,

    /// Neighbours consulted when cleaning majority samples.
    #[serde(default = "default_enn_k")]
    pub enn_k_neighbors: usize,

    #[serde(default = "default_enn_selection")]
    pub enn_selection: EnnSelection,

    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            smote_k_neighbors: default_smote_k(),
            enn_k_neighbors: default_enn_k(),
            enn_selection: default_enn_selection(),
            random_seed: default_random_seed(),
        }
    }
}

fn default_smote_k() -> usize {
    5
}

fn default_enn_k() -> usize {
    3
}

fn default_enn_selection() -> EnnSelection {
    EnnSelection::All
}

fn default_random_seed() -> u64 {
    42
}
