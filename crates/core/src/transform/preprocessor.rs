//! The fitted preprocessing chain persisted with every model.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::encoder::OneHotEncoder;
use super::error::TransformError;
use super::scaler::ColumnScaler;
use crate::dataset::{DataFrame, DatasetError};

/// Drop, encode and scale, with every parameter fixed at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Target column, ignored if present in the input.
    pub target: String,
    pub drop_columns: Vec<String>,
    pub encoder: OneHotEncoder,
    /// Column order of the encoded frame the scaler was fitted on.
    pub encoded_names: Vec<String>,
    pub scaler: ColumnScaler,
}

impl Preprocessor {
    /// Drop and encode, returning the unscaled feature matrix.
    pub fn encode(&self, frame: &DataFrame) -> Result<Array2<f64>, TransformError> {
        let mut ignored = self.drop_columns.clone();
        ignored.push(self.target.clone());
        let encoded = self.encoder.transform(&frame.drop_columns(&ignored))?;
        feature_array(&encoded, &self.encoded_names)
    }

    /// Full transform into the feature space the classifier was trained on.
    pub fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>, TransformError> {
        let encoded = self.encode(frame)?;
        self.scaler.transform(&encoded)
    }

    /// Output feature names, in column order.
    pub fn feature_names(&self) -> Vec<String> {
        self.scaler.output_names()
    }
}

/// Numeric matrix of `names`. Missing cells are rejected.
pub(crate) fn feature_array(
    frame: &DataFrame,
    names: &[String],
) -> Result<Array2<f64>, TransformError> {
    let x = frame.to_array(names).map_err(|e| match e {
        DatasetError::MissingColumn(name) => TransformError::MissingColumn(name),
        DatasetError::NonNumeric { column, .. } => TransformError::NonNumericFeature(column),
        other => TransformError::Dataset(other),
    })?;
    for (j, column) in x.columns().into_iter().enumerate() {
        if column.iter().any(|v| v.is_nan()) {
            return Err(TransformError::MissingValues(names[j].clone()));
        }
    }
    Ok(x)
}
