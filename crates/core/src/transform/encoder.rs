//! One-hot encoding with the first level dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::error::TransformError;
use crate::dataset::{Column, ColumnData, DataFrame};
use crate::schema::{encoded_column_name, Schema};

/// Levels and output names for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedCategory {
    pub column: String,
    /// All levels in encoding order. The first one is the dropped baseline.
    pub levels: Vec<String>,
    /// Output column names for `levels[1..]`.
    pub output_names: Vec<String>,
}

/// Fitted one-hot encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<EncodedCategory>,
}

impl OneHotEncoder {
    /// Learn levels for every categorical column of the schema.
    ///
    /// Declared levels are used verbatim. Otherwise the distinct values of the
    /// training partition are taken in sorted order (numeric order when every
    /// value parses as a number).
    pub fn fit(frame: &DataFrame, schema: &Schema) -> Result<Self, TransformError> {
        let mut categories = Vec::with_capacity(schema.categorical_columns.len());

        for name in &schema.categorical_columns {
            let column = frame
                .column(name)
                .ok_or_else(|| TransformError::MissingColumn(name.clone()))?;

            let levels = match schema.levels_for(name) {
                Some(declared) => declared.to_vec(),
                None => observed_levels(column),
            };
            let output_names = levels
                .iter()
                .skip(1)
                .map(|level| encoded_column_name(name, level))
                .collect();

            debug!(column = %name, levels = ?levels, "Fitted categorical levels");
            categories.push(EncodedCategory {
                column: name.clone(),
                levels,
                output_names,
            });
        }

        Ok(Self { categories })
    }

    /// Replace each categorical column by its indicator columns, appended at
    /// the end in category order. Unknown values encode as all zeros.
    pub fn transform(&self, frame: &DataFrame) -> Result<DataFrame, TransformError> {
        let source_names: Vec<String> = self.categories.iter().map(|c| c.column.clone()).collect();
        let mut out = frame.drop_columns(&source_names);

        for category in &self.categories {
            let column = frame
                .column(&category.column)
                .ok_or_else(|| TransformError::MissingColumn(category.column.clone()))?;
            let cells: Vec<String> = (0..column.len())
                .map(|row| column.data.cell_string(row))
                .collect();

            let unknown = cells
                .iter()
                .filter(|c| !category.levels.contains(c))
                .count();
            if unknown > 0 {
                warn!(
                    column = %category.column,
                    rows = unknown,
                    "Unseen categorical values encoded as baseline"
                );
            }

            for (level, output) in category.levels.iter().skip(1).zip(&category.output_names) {
                let indicator = cells.iter().map(|c| i64::from(c == level)).collect();
                out.push_column(Column::new(output.clone(), ColumnData::Int64(indicator)))?;
            }
        }

        Ok(out)
    }

    /// Names of every indicator column this encoder produces.
    pub fn output_columns(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.output_names.iter().cloned())
            .collect()
    }
}

fn observed_levels(column: &Column) -> Vec<String> {
    let distinct: BTreeSet<String> = (0..column.len())
        .map(|row| column.data.cell_string(row))
        .collect();
    let mut levels: Vec<String> = distinct.into_iter().collect();

    let numeric: Option<Vec<f64>> = levels.iter().map(|l| l.parse::<f64>().ok()).collect();
    if let Some(values) = numeric {
        let mut paired: Vec<(f64, String)> = values.into_iter().zip(levels).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));
        levels = paired.into_iter().map(|(_, l)| l).collect();
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(levels: &str) -> Schema {
        Schema::from_yaml_str(&format!(
            r#"
columns:
  Gender: object
  Vehicle_Age: object
  Age: int
  Response: int
numerical_columns: [Age]
categorical_columns: [Gender, Vehicle_Age]
target_columns: [Response]
{}
"#,
            levels
        ))
        .unwrap()
    }

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "Gender",
                ColumnData::Object(vec!["Male".into(), "Female".into(), "Male".into()]),
            ),
            Column::new(
                "Vehicle_Age",
                ColumnData::Object(vec!["< 1 Year".into(), "1-2 Year".into(), "> 2 Years".into()]),
            ),
            Column::new("Age", ColumnData::Int64(vec![22, 35, 61])),
        ])
        .unwrap()
    }

    #[test]
    fn test_learned_levels_drop_first() {
        let encoder = OneHotEncoder::fit(&frame(), &schema("")).unwrap();
        let encoded = encoder.transform(&frame()).unwrap();

        assert_eq!(
            encoded.column_names(),
            vec!["Age", "Gender_Male", "Vehicle_Age_lt_1_Year", "Vehicle_Age_gt_2_Years"]
        );
        assert_eq!(
            encoded.column("Gender_Male").unwrap().data,
            ColumnData::Int64(vec![1, 0, 1])
        );
    }

    #[test]
    fn test_declared_levels_drive_names() {
        let encoder = OneHotEncoder::fit(
            &frame(),
            &schema(
                "categorical_levels:\n  Vehicle_Age: [\"< 1 Year\", \"1-2 Year\", \"> 2 Years\"]",
            ),
        )
        .unwrap();
        assert_eq!(
            encoder.output_columns(),
            vec!["Gender_Male", "Vehicle_Age_1_2_Year", "Vehicle_Age_gt_2_Years"]
        );
    }

    #[test]
    fn test_unknown_level_encodes_as_zeros() {
        let encoder = OneHotEncoder::fit(&frame(), &schema("")).unwrap();
        let unseen = DataFrame::new(vec![
            Column::new("Gender", ColumnData::Object(vec!["Other".into()])),
            Column::new("Vehicle_Age", ColumnData::Object(vec!["1-2 Year".into()])),
            Column::new("Age", ColumnData::Int64(vec![40])),
        ])
        .unwrap();

        let encoded = encoder.transform(&unseen).unwrap();
        assert_eq!(
            encoded.column("Gender_Male").unwrap().data,
            ColumnData::Int64(vec![0])
        );
    }

    #[test]
    fn test_numeric_levels_sort_numerically() {
        let column = Column::new("Code", ColumnData::Int64(vec![10, 9, 2, 10]));
        assert_eq!(observed_levels(&column), vec!["2", "9", "10"]);
    }

    #[test]
    fn test_missing_categorical_column() {
        let frame = frame().drop_columns(&["Gender".to_string()]);
        assert!(matches!(
            OneHotEncoder::fit(&frame, &schema("")),
            Err(TransformError::MissingColumn(_))
        ));
    }
}
