//! Binary decision tree stored as a flat node arena.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Gini,
    Entropy,
}

impl Criterion {
    /// Impurity of a node holding `positives` out of `total` samples.
    fn impurity(&self, positives: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let p = positives as f64 / total as f64;
        let q = 1.0 - p;
        match self {
            Criterion::Gini => 1.0 - p * p - q * q,
            Criterion::Entropy => {
                let h = |x: f64| if x > 0.0 { -x * x.log2() } else { 0.0 };
                h(p) + h(q)
            }
        }
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered at each split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        /// Fraction of training samples in this leaf labelled 1.
        positive_rate: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        /// Rows with `x[feature] <= threshold` go left; NaN goes right.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

struct Builder<'a, 'b, 'p> {
    x: ArrayView2<'a, f64>,
    y: &'b [i64],
    params: &'p TreeParams,
    nodes: Vec<TreeNode>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed).
    pub fn fit(
        x: ArrayView2<f64>,
        y: &[i64],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            nodes: Vec::new(),
        };
        builder.grow(samples, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Probability of class 1 for one row.
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { positive_rate, .. }) => return *positive_rate,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Builder<'_, '_, '_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let idx = self.nodes.len();
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let leaf = TreeNode::Leaf {
            positive_rate: if n == 0 { 0.0 } else { positives as f64 / n as f64 },
            samples: n,
        };
        self.nodes.push(leaf);

        let p = self.params;
        if depth >= p.max_depth
            || n < p.min_samples_split
            || n < 2 * p.min_samples_leaf
            || positives == 0
            || positives == n
        {
            return idx;
        }

        let Some(best) = self.best_split(&samples, positives, rng) else {
            return idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);

        let left_idx = self.grow(left, depth + 1, rng);
        let right_idx = self.grow(right, depth + 1, rng);
        self.nodes[idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn best_split(
        &self,
        samples: &[usize],
        positives: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n = samples.len();
        let n_features = self.x.ncols();
        if n_features == 0 {
            return None;
        }
        let k = self.params.max_features.clamp(1, n_features);
        let criterion = self.params.criterion;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent = criterion.impurity(positives, n);

        let mut best: Option<BestSplit> = None;
        for feature in sample(rng, n_features, k).into_iter() {
            let mut column: Vec<(f64, bool)> = samples
                .iter()
                .map(|&i| (self.x[[i, feature]], self.y[i] == 1))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for split in 1..n {
                if column[split - 1].1 {
                    left_pos += 1;
                }
                let (lo, hi) = (column[split - 1].0, column[split].0);
                if split < min_leaf || n - split < min_leaf {
                    continue;
                }
                if lo.is_nan() || hi.is_nan() || lo >= hi {
                    continue;
                }

                let weighted = (split as f64 * criterion.impurity(left_pos, split)
                    + (n - split) as f64 * criterion.impurity(positives - left_pos, n - split))
                    / n as f64;
                let gain = parent - weighted;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mid = lo + (hi - lo) / 2.0;
                    best = Some(BestSplit {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params(criterion: Criterion) -> TreeParams {
        TreeParams {
            criterion,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn test_learns_threshold() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = DecisionTree::fit(x.view(), &y, (0..6).collect(), &params(Criterion::Gini), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba_row(array![2.5, 0.0].view()), 0.0);
        assert_eq!(tree.predict_proba_row(array![11.5, 0.0].view()), 1.0);
    }

    #[test]
    fn test_respects_max_depth_and_min_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = [0, 1, 0, 1, 0, 1, 0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut p = params(Criterion::Entropy);
        p.max_depth = 2;
        p.min_samples_leaf = 2;
        let tree = DecisionTree::fit(x.view(), &y, (0..8).collect(), &p, &mut rng);

        assert!(tree.depth() <= 2);
        for node in &tree.nodes {
            if let TreeNode::Leaf { samples, .. } = node {
                assert!(*samples >= 2);
            }
        }
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[1.0], [2.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = DecisionTree::fit(x.view(), &[1, 1], vec![0, 1], &params(Criterion::Gini), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba_row(array![5.0].view()), 1.0);
    }

    /// Trees outlive the params and labels they were grown from.
    fn grow_with_scoped_params(x: ArrayView2<f64>) -> DecisionTree {
        let labels: Vec<i64> = (0..x.nrows()).map(|i| i64::from(i >= x.nrows() / 2)).collect();
        let scoped = params(Criterion::Entropy);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        DecisionTree::fit(x, &labels, (0..x.nrows()).collect(), &scoped, &mut rng)
    }

    #[test]
    fn test_tree_outlives_fit_inputs() {
        let x = array![[1.0], [2.0], [8.0], [9.0]];
        let tree = grow_with_scoped_params(x.view());
        assert_eq!(tree.predict_proba_row(array![8.5].view()), 1.0);
    }

    #[test]
    fn test_impurity() {
        assert_eq!(Criterion::Entropy.impurity(5, 10), 1.0);
        assert_eq!(Criterion::Gini.impurity(5, 10), 0.5);
        assert_eq!(Criterion::Entropy.impurity(0, 10), 0.0);
    }
}
