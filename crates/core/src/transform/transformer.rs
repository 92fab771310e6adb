use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::config::TransformationConfig;
use super::encoder::OneHotEncoder;
use super::error::TransformError;
use super::preprocessor::{feature_array, Preprocessor};
use super::resample::{class_counts, SmoteEnn};
use super::scaler::ColumnScaler;
use crate::artifact::{write_json, IngestionArtifact, RunLayout, TransformationArtifact};
use crate::dataset::{read_csv, Column, ColumnData, DataFrame};
use crate::error::StageError;
use crate::schema::Schema;

/// A transformed partition: feature columns followed by the target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedSplit {
    pub feature_names: Vec<String>,
    pub target: String,
    pub data: Array2<f64>,
}

impl TransformedSplit {
    /// Concatenate features and target, refusing mismatched row counts.
    pub fn new(
        features: Array2<f64>,
        target: &[i64],
        feature_names: Vec<String>,
        target_name: &str,
    ) -> Result<Self, TransformError> {
        if features.nrows() != target.len() {
            error!(
                features = features.nrows(),
                target = target.len(),
                "Feature/target row mismatch"
            );
            return Err(TransformError::RowMismatch {
                features: features.nrows(),
                target: target.len(),
            });
        }
        let target_col =
            Array2::from_shape_fn((target.len(), 1), |(i, _)| target[i] as f64);
        let data = concatenate(Axis(1), &[features.view(), target_col.view()])
            .map_err(|_| TransformError::WidthMismatch {
                expected: feature_names.len(),
                actual: features.ncols(),
            })?;
        Ok(Self {
            feature_names,
            target: target_name.to_string(),
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Every column except the last.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        let n = self.data.ncols().saturating_sub(1);
        self.data.slice(s![.., ..n])
    }

    /// The last column as class labels.
    pub fn targets(&self) -> Vec<i64> {
        match self.data.ncols() {
            0 => Vec::new(),
            n => self.data.column(n - 1).iter().map(|v| *v as i64).collect(),
        }
    }
}

/// Integral class labels from a target column.
pub fn target_vector(column: &Column) -> Result<Vec<i64>, TransformError> {
    let invalid = |row| TransformError::InvalidTarget {
        column: column.name.clone(),
        row,
    };
    match &column.data {
        ColumnData::Int64(v) => Ok(v.clone()),
        ColumnData::Bool(v) => Ok(v.iter().map(|&b| i64::from(b)).collect()),
        ColumnData::Float64(v) => v
            .iter()
            .enumerate()
            .map(|(row, x)| {
                if x.is_finite() && x.fract() == 0.0 {
                    Ok(*x as i64)
                } else {
                    Err(invalid(row))
                }
            })
            .collect(),
        ColumnData::Object(v) => v
            .iter()
            .enumerate()
            .map(|(row, s)| s.trim().parse::<i64>().map_err(|_| invalid(row)))
            .collect(),
    }
}

/// Fits the preprocessor on the training partition and applies it to both.
pub struct DataTransformation<'a> {
    schema: &'a Schema,
    config: &'a TransformationConfig,
}

impl<'a> DataTransformation<'a> {
    pub fn new(schema: &'a Schema, config: &'a TransformationConfig) -> Self {
        Self { schema, config }
    }

    /// Fit on the training partition. Resampling happens here and only here.
    pub fn fit_transform_train(
        &self,
        train: DataFrame,
    ) -> Result<(Preprocessor, TransformedSplit), StageError> {
        let target_name = self.schema.target_column()?.to_string();
        let (features, target) = train.split_column(&target_name)?;
        let y = target_vector(&target)?;

        let features = features.drop_columns(&self.schema.drop_columns);
        let encoder = OneHotEncoder::fit(&features, self.schema)?;
        let encoded = encoder.transform(&features)?;
        let encoded_names: Vec<String> =
            encoded.column_names().into_iter().map(String::from).collect();
        let x = feature_array(&encoded, &encoded_names)?;

        let (x_res, y_res) = SmoteEnn::new(self.config).fit_resample(&x, &y)?;
        info!(
            before = ?class_counts(&y),
            after = ?class_counts(&y_res),
            "Class counts after resampling"
        );

        let scaler = ColumnScaler::fit(
            &x_res,
            &encoded_names,
            &self.schema.standardize_columns,
            &self.schema.min_max_columns,
        )?;
        let x_scaled = scaler.transform(&x_res)?;

        let preprocessor = Preprocessor {
            target: target_name.clone(),
            drop_columns: self.schema.drop_columns.clone(),
            encoder,
            encoded_names,
            scaler,
        };
        let split = TransformedSplit::new(
            x_scaled,
            &y_res,
            preprocessor.feature_names(),
            &target_name,
        )?;
        Ok((preprocessor, split))
    }

    /// Apply an already fitted preprocessor. No resampling, no refit.
    pub fn transform_test(
        &self,
        preprocessor: &Preprocessor,
        test: DataFrame,
    ) -> Result<TransformedSplit, StageError> {
        let (features, target) = test.split_column(&preprocessor.target)?;
        let y = target_vector(&target)?;
        let x = preprocessor.transform(&features)?;
        Ok(TransformedSplit::new(
            x,
            &y,
            preprocessor.feature_names(),
            &preprocessor.target,
        )?)
    }

    /// Transform the ingested partitions and persist the preprocessor and arrays.
    pub fn run(
        &self,
        ingestion: &IngestionArtifact,
        layout: &RunLayout,
    ) -> Result<TransformationArtifact, StageError> {
        let train = read_csv(&ingestion.train_path)?;
        let test = read_csv(&ingestion.test_path)?;

        let (preprocessor, train_split) = self.fit_transform_train(train)?;
        let test_split = self.transform_test(&preprocessor, test)?;

        let artifact = TransformationArtifact {
            preprocessor_path: layout.preprocessor_file(),
            transformed_train_path: layout.transformed_train_file(),
            transformed_test_path: layout.transformed_test_file(),
            train_rows: train_split.n_rows(),
            test_rows: test_split.n_rows(),
        };
        write_json(&artifact.preprocessor_path, &preprocessor)?;
        write_json(&artifact.transformed_train_path, &train_split)?;
        write_json(&artifact.transformed_test_path, &test_split)?;

        info!(
            train_rows = artifact.train_rows,
            test_rows = artifact.test_rows,
            features = preprocessor.feature_names().len(),
            "Data transformation complete"
        );
        Ok(artifact)
    }
}
