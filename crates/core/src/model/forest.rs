//! Bagged ensemble of decision trees.

use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ModelError;
use super::tree::{Criterion, DecisionTree, TreeParams};

/// Fixed hyperparameters of the ensemble.
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub criterion: Criterion,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_seed: u64,
}

/// Random forest for binary targets.
///
/// Each tree sees a bootstrap sample and `sqrt(n_features)` candidate
/// features per split. Class probabilities are averaged across trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(x: ArrayView2<f64>, y: &[i64], params: &ForestParams) -> Result<Self, ModelError> {
        let n = x.nrows();
        if n == 0 || params.n_estimators == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n {
            return Err(ModelError::LabelMismatch {
                rows: n,
                labels: y.len(),
            });
        }

        let n_features = x.ncols();
        let tree_params = TreeParams {
            criterion: params.criterion,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let mut seeder = ChaCha8Rng::seed_from_u64(params.random_seed);
        let trees = (0..params.n_estimators)
            .map(|_| {
                let mut rng = ChaCha8Rng::seed_from_u64(seeder.gen());
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, bootstrap, &tree_params, &mut rng)
            })
            .collect::<Vec<_>>();

        debug!(
            trees = trees.len(),
            mean_depth = trees.iter().map(DecisionTree::depth).sum::<usize>() as f64
                / trees.len() as f64,
            "Fitted random forest"
        );
        Ok(Self { n_features, trees })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean probability of class 1 per row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>, ModelError> {
        if x.ncols() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        let n_trees = self.trees.len().max(1) as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|t| t.predict_proba_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }

    /// Class labels; ties go to class 0.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i64>, ModelError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(Self::label)
            .collect())
    }

    /// Label for a class-1 probability.
    pub fn label(probability: f64) -> i64 {
        i64::from(probability > 0.5)
    }
}
