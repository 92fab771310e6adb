use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifact::{write_json, IngestionArtifact, RunLayout, ValidationArtifact};
use crate::dataset::{read_csv, DataFrame};
use crate::error::StageError;
use crate::schema::{is_dtype_compatible, Schema};

/// JSON report persisted by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
}

/// A declared column whose storage type is outside its equivalence class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtypeMismatch {
    pub column: String,
    pub expected: String,
    pub actual: String,
}

/// Required numerical/categorical columns absent from a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPresence {
    pub missing_numerical: Vec<String>,
    pub missing_categorical: Vec<String>,
}

impl ColumnPresence {
    pub fn all_present(&self) -> bool {
        self.missing_numerical.is_empty() && self.missing_categorical.is_empty()
    }
}

/// Checks both partitions against the schema.
///
/// Every check runs for both partitions before the outcome is decided, so the
/// report lists all failures at once.
pub struct DataValidation<'a> {
    schema: &'a Schema,
}

impl<'a> DataValidation<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Column count equals the declared column count.
    pub fn validate_number_of_columns(&self, frame: &DataFrame) -> bool {
        let status = frame.n_cols() == self.schema.columns.len();
        debug!(
            actual = frame.n_cols(),
            expected = self.schema.columns.len(),
            status,
            "Validated number of columns"
        );
        status
    }

    /// Declared columns whose storage type does not match. Absent columns are
    /// skipped; presence is checked separately.
    pub fn validate_column_data_types(&self, frame: &DataFrame) -> Vec<DtypeMismatch> {
        let mismatches: Vec<DtypeMismatch> = self
            .schema
            .columns
            .iter()
            .filter_map(|spec| {
                let column = frame.column(&spec.name)?;
                if is_dtype_compatible(&spec.declared_type, column.dtype()) {
                    None
                } else {
                    Some(DtypeMismatch {
                        column: spec.name.clone(),
                        expected: spec.declared_type.clone(),
                        actual: column.dtype().to_string(),
                    })
                }
            })
            .collect();

        for m in &mismatches {
            warn!(
                column = %m.column,
                expected = %m.expected,
                found = %m.actual,
                "Data type mismatch"
            );
        }
        mismatches
    }

    /// Which required numerical and categorical columns are missing.
    pub fn does_all_column_exist(&self, frame: &DataFrame) -> ColumnPresence {
        let missing = |names: &[String]| -> Vec<String> {
            names
                .iter()
                .filter(|n| !frame.has_column(n))
                .cloned()
                .collect()
        };
        let presence = ColumnPresence {
            missing_numerical: missing(&self.schema.numerical_columns),
            missing_categorical: missing(&self.schema.categorical_columns),
        };
        if !presence.missing_numerical.is_empty() {
            info!(columns = ?presence.missing_numerical, "Missing numerical columns");
        }
        if !presence.missing_categorical.is_empty() {
            info!(columns = ?presence.missing_categorical, "Missing categorical columns");
        }
        presence
    }

    /// Run every check on both partitions and collect failure descriptions.
    pub fn validate(&self, train: &DataFrame, test: &DataFrame) -> Vec<String> {
        let mut failures = Vec::new();
        let partitions = [("training", train), ("test", test)];

        for (label, frame) in partitions {
            if !self.validate_number_of_columns(frame) {
                failures.push(format!("Columns are missing in {} dataframe.", label));
            }
        }
        for (label, frame) in partitions {
            if !self.validate_column_data_types(frame).is_empty() {
                failures.push(format!("Data type mismatch in {} dataframe.", label));
            }
        }
        for (label, frame) in partitions {
            if !self.does_all_column_exist(frame).all_present() {
                failures.push(format!(
                    "Required numerical/categorical columns are missing in {} dataframe.",
                    label
                ));
            }
        }
        failures
    }

    /// Validate the ingested partitions and persist the report.
    ///
    /// A failed validation is not an error: the artifact carries
    /// `status = false` and the report is still written.
    pub fn run(
        &self,
        ingestion: &IngestionArtifact,
        layout: &RunLayout,
    ) -> Result<ValidationArtifact, StageError> {
        let train = read_csv(&ingestion.train_path)?;
        let test = read_csv(&ingestion.test_path)?;

        let failures = self.validate(&train, &test);
        let message = failures.join("\n");
        let status = failures.is_empty();

        let report_path = layout.validation_report();
        write_json(
            &report_path,
            &ValidationReport {
                validation_status: status,
                message: message.trim().to_string(),
            },
        )?;

        if status {
            info!("Data validation passed");
        } else {
            warn!(failures = failures.len(), "Data validation failed");
        }

        Ok(ValidationArtifact {
            status,
            message,
            report_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnData};
    use crate::testing::fixtures;

    fn small_schema() -> Schema {
        Schema::from_yaml_str(
            r#"
columns:
  - Age: int
  - Premium: float
  - Gender: object
  - Response: int
numerical_columns: [Age, Premium]
categorical_columns: [Gender]
target_columns: [Response]
"#,
        )
        .unwrap()
    }

    fn matching_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Age", ColumnData::Int64(vec![30, 40])),
            Column::new("Premium", ColumnData::Float64(vec![10.0, 20.5])),
            Column::new("Gender", ColumnData::Object(vec!["Male".into(), "Female".into()])),
            Column::new("Response", ColumnData::Int64(vec![0, 1])),
        ])
        .unwrap()
    }

    #[test]
    fn test_matching_partitions_pass() {
        let schema = small_schema();
        let validation = DataValidation::new(&schema);
        let frame = matching_frame();
        assert!(validation.validate(&frame, &frame).is_empty());
    }

    #[test]
    fn test_missing_numerical_column_reported() {
        let schema = small_schema();
        let validation = DataValidation::new(&schema);
        let frame = matching_frame().drop_columns(&["Premium".to_string()]);

        let presence = validation.does_all_column_exist(&frame);
        assert_eq!(presence.missing_numerical, vec!["Premium"]);
        assert!(presence.missing_categorical.is_empty());

        let failures = validation.validate(&frame, &matching_frame());
        assert_eq!(
            failures,
            vec![
                "Columns are missing in training dataframe.",
                "Required numerical/categorical columns are missing in training dataframe.",
            ]
        );
    }

    #[test]
    fn test_dtype_mismatch_reported_for_both_partitions() {
        let schema = small_schema();
        let validation = DataValidation::new(&schema);
        let frame = DataFrame::new(vec![
            Column::new("Age", ColumnData::Float64(vec![30.0, 40.0])),
            Column::new("Premium", ColumnData::Float64(vec![10.0, 20.5])),
            Column::new("Gender", ColumnData::Object(vec!["Male".into(), "Female".into()])),
            Column::new("Response", ColumnData::Int64(vec![0, 1])),
        ])
        .unwrap();

        let mismatches = validation.validate_column_data_types(&frame);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].column, "Age");
        assert_eq!(mismatches[0].actual, "float64");

        let failures = validation.validate(&frame, &frame);
        assert_eq!(
            failures,
            vec![
                "Data type mismatch in training dataframe.",
                "Data type mismatch in test dataframe.",
            ]
        );
    }

    #[test]
    fn test_run_persists_report_on_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let schema = fixtures::insurance_schema();

        let bad = matching_frame();
        crate::dataset::write_csv(&bad, &layout.train_file()).unwrap();
        crate::dataset::write_csv(&bad, &layout.test_file()).unwrap();
        let ingestion = IngestionArtifact {
            feature_store_path: layout.feature_store_file(),
            train_path: layout.train_file(),
            test_path: layout.test_file(),
            train_rows: 2,
            test_rows: 2,
        };

        let artifact = DataValidation::new(&schema).run(&ingestion, &layout).unwrap();
        assert!(!artifact.status);
        assert!(!artifact.message.is_empty());

        let report: ValidationReport =
            serde_json::from_str(&std::fs::read_to_string(&artifact.report_path).unwrap())
                .unwrap();
        assert!(!report.validation_status);
        assert_eq!(report.message, artifact.message);
    }
}
