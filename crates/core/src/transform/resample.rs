//! SMOTE oversampling followed by edited-nearest-neighbour cleaning.

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use ndarray::{Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::config::{EnnSelection, TransformationConfig};
use super::error::TransformError;

/// Class-imbalance resampler for binary targets.
#[derive(Debug, Clone)]
pub struct SmoteEnn {
    smote_k: usize,
    enn_k: usize,
    selection: EnnSelection,
    seed: u64,
}

impl SmoteEnn {
    pub fn new(config: &TransformationConfig) -> Self {
        Self {
            smote_k: config.smote_k_neighbors,
            enn_k: config.enn_k_neighbors,
            selection: config.enn_selection,
            seed: config.random_seed,
        }
    }

    /// Oversample the minority class up to the majority count, then drop
    /// samples of either class whose neighbourhood disagrees with their label.
    ///
    /// Cleaning never leaves the classes further from 1:1 than the input was:
    /// edited rows of the smaller class are restored, least noisy first,
    /// until the output ratio beats the input ratio.
    pub fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &[i64],
    ) -> Result<(Array2<f64>, Vec<i64>), TransformError> {
        if x.nrows() != y.len() {
            return Err(TransformError::RowMismatch {
                features: x.nrows(),
                target: y.len(),
            });
        }
        let counts = class_counts(y);
        if counts.len() != 2 {
            return Err(TransformError::ClassCount(counts.len()));
        }
        if x.ncols() == 0 {
            debug!("No feature columns; skipping resampling");
            return Ok((x.clone(), y.to_vec()));
        }

        // Ties resolve to the larger label as minority.
        let mut by_count: Vec<(i64, usize)> = counts.into_iter().collect();
        by_count.sort_by_key(|&(label, count)| (count, Reverse(label)));
        let (minority, n_min) = by_count[0];
        let (_, n_maj) = by_count[1];

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let (x_over, y_over) = self.oversample(x, y, minority, n_maj - n_min, &mut rng)?;
        let (x_out, y_out) = self.clean(&x_over, &y_over, (n_min, n_maj))?;

        info!(
            before = y.len(),
            after = y_out.len(),
            minority,
            synthesized = n_maj - n_min,
            "Resampled training split"
        );
        Ok((x_out, y_out))
    }

    fn oversample(
        &self,
        x: &Array2<f64>,
        y: &[i64],
        minority: i64,
        n_new: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<(Array2<f64>, Vec<i64>), TransformError> {
        let minority_idx: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority).collect();
        let k = self.smote_k.min(minority_idx.len().saturating_sub(1));
        if n_new == 0 || k == 0 {
            debug!(k, n_new, "Skipping oversampling");
            return Ok((x.clone(), y.to_vec()));
        }

        let index = NeighbourIndex::build(x, &minority_idx)?;
        let neighbours = minority_idx
            .iter()
            .map(|&i| index.neighbours(x, i, k))
            .collect::<Result<Vec<_>, _>>()?;

        let width = x.ncols();
        let mut out = Array2::<f64>::zeros((x.nrows() + n_new, width));
        out.slice_mut(ndarray::s![..x.nrows(), ..]).assign(x);
        for r in 0..n_new {
            let pick = rng.gen_range(0..minority_idx.len());
            let base = x.row(minority_idx[pick]);
            let other = match neighbours[pick].len() {
                0 => base,
                n => x.row(neighbours[pick][rng.gen_range(0..n)]),
            };
            let gap: f64 = rng.gen();
            for c in 0..width {
                out[[x.nrows() + r, c]] = base[c] + gap * (other[c] - base[c]);
            }
        }
        let mut labels = y.to_vec();
        labels.extend(std::iter::repeat(minority).take(n_new));
        Ok((out, labels))
    }

    /// Edited nearest neighbours over every class. `before` holds the
    /// (smaller, larger) class counts of the unresampled input.
    fn clean(
        &self,
        x: &Array2<f64>,
        y: &[i64],
        before: (usize, usize),
    ) -> Result<(Array2<f64>, Vec<i64>), TransformError> {
        let k = self.enn_k.min(y.len().saturating_sub(1));
        if k == 0 {
            return Ok((x.clone(), y.to_vec()));
        }

        let all: Vec<usize> = (0..y.len()).collect();
        let index = NeighbourIndex::build(x, &all)?;
        let mut keep = vec![true; y.len()];
        let mut kept = class_counts(y);
        // Edited rows per class as (agreeing neighbours, row).
        let mut edited: BTreeMap<i64, Vec<(usize, usize)>> = BTreeMap::new();
        for i in 0..y.len() {
            let nn = index.neighbours(x, i, k)?;
            let agreeing = nn.iter().filter(|&&j| y[j] == y[i]).count();
            let consistent = match self.selection {
                EnnSelection::All => agreeing == nn.len(),
                EnnSelection::Mode => agreeing * 2 > nn.len(),
            };
            if !consistent {
                keep[i] = false;
                edited.entry(y[i]).or_default().push((agreeing, i));
                if let Some(count) = kept.get_mut(&y[i]) {
                    *count -= 1;
                }
            }
        }
        let removed = keep.iter().filter(|&&row_kept| !row_kept).count();

        // Pop order: most agreeing neighbours first, then lowest row.
        for rows in edited.values_mut() {
            rows.sort_by_key(|&(agreeing, i)| (agreeing, Reverse(i)));
        }
        let (n_small, n_large) = before;
        let mut restored = 0;
        loop {
            let Some((small_label, small, large)) = smaller_class(&kept) else {
                break;
            };
            let balanced_enough =
                small > 0 && (small == large || small * n_large > n_small * large);
            if balanced_enough {
                break;
            }
            let Some((_, i)) = edited.get_mut(&small_label).and_then(Vec::pop) else {
                break;
            };
            keep[i] = true;
            if let Some(count) = kept.get_mut(&small_label) {
                *count += 1;
            }
            restored += 1;
        }

        debug!(removed, restored, "Edited nearest neighbours");
        let rows: Vec<usize> = (0..y.len()).filter(|&i| keep[i]).collect();
        let labels = rows.iter().map(|&i| y[i]).collect();
        Ok((x.select(Axis(0), &rows), labels))
    }
}

/// (label, count) of the smaller class and the count of the larger one.
fn smaller_class(counts: &BTreeMap<i64, usize>) -> Option<(i64, usize, usize)> {
    let small = counts.iter().min_by_key(|&(_, &c)| c)?;
    let large = counts.values().copied().max()?;
    Some((*small.0, *small.1, large))
}

/// Count of each class label.
pub fn class_counts(y: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// kd-tree over a subset of rows, answering k-nearest queries by row index.
struct NeighbourIndex {
    tree: KdTree<f64, usize, Vec<f64>>,
}

impl NeighbourIndex {
    fn build(x: &Array2<f64>, rows: &[usize]) -> Result<Self, TransformError> {
        let mut tree = KdTree::new(x.ncols());
        for &i in rows {
            tree.add(x.row(i).to_vec(), i)
                .map_err(|e| TransformError::NeighbourIndex(format!("{:?}", e)))?;
        }
        Ok(Self { tree })
    }

    /// The `k` indexed rows closest to row `i`, excluding `i` itself.
    fn neighbours(&self, x: &Array2<f64>, i: usize, k: usize) -> Result<Vec<usize>, TransformError> {
        let point = x.row(i).to_vec();
        let found = self
            .tree
            .nearest(&point, k + 1, &squared_euclidean)
            .map_err(|e| TransformError::NeighbourIndex(format!("{:?}", e)))?;
        Ok(found
            .into_iter()
            .map(|(_, &j)| j)
            .filter(|&j| j != i)
            .take(k)
            .collect())
    }
}
