//! Column-wise scaling: standardize, min-max, or pass through.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::TransformError;

/// Fitted parameters for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleKind {
    /// `(x - mean) / scale`
    Standard { mean: f64, scale: f64 },
    /// `(x - min) / range`
    MinMax { min: f64, range: f64 },
    Passthrough,
}

impl ScaleKind {
    fn apply(&self, x: f64) -> f64 {
        match self {
            ScaleKind::Standard { mean, scale } => (x - mean) / scale,
            ScaleKind::MinMax { min, range } => (x - min) / range,
            ScaleKind::Passthrough => x,
        }
    }
}

/// One output column and the input column it is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub name: String,
    pub input_index: usize,
    pub kind: ScaleKind,
}

/// Fitted column scaler.
///
/// Output order is standardized columns, then min-max columns, then the
/// remaining columns in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub input_names: Vec<String>,
    pub columns: Vec<ScaledColumn>,
}

impl ColumnScaler {
    /// Fit on `x`, whose columns are named by `names`.
    ///
    /// Statistics ignore NaN cells. A zero variance or zero range leaves the
    /// column centred but unscaled.
    pub fn fit(
        x: &Array2<f64>,
        names: &[String],
        standardize: &[String],
        min_max: &[String],
    ) -> Result<Self, TransformError> {
        if x.ncols() != names.len() {
            return Err(TransformError::WidthMismatch {
                expected: names.len(),
                actual: x.ncols(),
            });
        }
        let index_of = |name: &String| {
            names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| TransformError::MissingColumn(name.clone()))
        };

        let mut columns = Vec::with_capacity(names.len());
        for name in standardize {
            let idx = index_of(name)?;
            let values = present_values(x, idx);
            let (mean, std) = mean_std(&values);
            columns.push(ScaledColumn {
                name: name.clone(),
                input_index: idx,
                kind: ScaleKind::Standard {
                    mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                },
            });
        }
        for name in min_max {
            let idx = index_of(name)?;
            let values = present_values(x, idx);
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let (min, range) = if values.is_empty() {
                (0.0, 1.0)
            } else if max > min {
                (min, max - min)
            } else {
                (min, 1.0)
            };
            columns.push(ScaledColumn {
                name: name.clone(),
                input_index: idx,
                kind: ScaleKind::MinMax { min, range },
            });
        }
        for (idx, name) in names.iter().enumerate() {
            if !standardize.contains(name) && !min_max.contains(name) {
                columns.push(ScaledColumn {
                    name: name.clone(),
                    input_index: idx,
                    kind: ScaleKind::Passthrough,
                });
            }
        }

        Ok(Self {
            input_names: names.to_vec(),
            columns,
        })
    }

    /// Apply the fitted parameters. Never changes them.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        if x.ncols() != self.input_names.len() {
            return Err(TransformError::WidthMismatch {
                expected: self.input_names.len(),
                actual: x.ncols(),
            });
        }
        let mut out = Array2::<f64>::zeros((x.nrows(), self.columns.len()));
        for (j, column) in self.columns.iter().enumerate() {
            let source = x.column(column.input_index);
            for (i, v) in source.iter().enumerate() {
                out[[i, j]] = column.kind.apply(*v);
            }
        }
        Ok(out)
    }

    /// Output column names in output order.
    pub fn output_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

fn present_values(x: &Array2<f64>, idx: usize) -> Vec<f64> {
    x.index_axis(Axis(1), idx)
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect()
}

/// Mean and population standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
