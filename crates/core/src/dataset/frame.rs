//! Column-typed row sets.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use super::error::DatasetError;

/// Document-store primary key, never part of the feature set.
const DOCUMENT_ID_FIELD: &str = "_id";

/// Marker the source collection uses for missing values.
const MISSING_MARKER: &str = "na";

/// Physical storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Int64,
    Float64,
    Bool,
    Object,
}

impl Dtype {
    /// Storage name as reported to the validator (`int64`, `float64`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::Bool => "bool",
            Dtype::Object => "object",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Object(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            ColumnData::Int64(_) => Dtype::Int64,
            ColumnData::Float64(_) => Dtype::Float64,
            ColumnData::Bool(_) => Dtype::Bool,
            ColumnData::Object(_) => Dtype::Object,
        }
    }

    /// Gather the given rows, in order. Indices must be in bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Int64(v) => ColumnData::Int64(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Float64(v) => {
                ColumnData::Float64(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Bool(v) => ColumnData::Bool(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Object(v) => {
                ColumnData::Object(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// Numeric view of the column. `None` for object columns.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Int64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnData::Float64(v) => Some(v.clone()),
            ColumnData::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            ColumnData::Object(_) => None,
        }
    }

    /// Text form of one cell. Floats keep a decimal point so a CSV round trip
    /// preserves the storage type.
    pub fn cell_string(&self, row: usize) -> String {
        match self {
            ColumnData::Int64(v) => v[row].to_string(),
            ColumnData::Float64(v) => {
                if v[row].is_nan() {
                    "NaN".to_string()
                } else {
                    format!("{:?}", v[row])
                }
            }
            ColumnData::Bool(v) => (if v[row] { "True" } else { "False" }).to_string(),
            ColumnData::Object(v) => v[row].clone(),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl DataFrame {
    /// Build a frame, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != n_rows {
                return Err(DatasetError::LengthMismatch {
                    column: column.name.clone(),
                    expected: n_rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Gather rows by index into a new frame.
    pub fn take_rows(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(indices)))
                .collect(),
            n_rows: indices.len(),
        }
    }

    /// Copy of the frame without the named columns. Absent names are ignored.
    pub fn drop_columns(&self, names: &[String]) -> DataFrame {
        DataFrame {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.iter().any(|n| n == &c.name))
                .cloned()
                .collect(),
            n_rows: self.n_rows,
        }
    }

    /// Detach one column, returning the remaining frame and the column.
    pub fn split_column(mut self, name: &str) -> Result<(DataFrame, Column), DatasetError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        let column = self.columns.remove(idx);
        Ok((self, column))
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if self.has_column(&column.name) {
            return Err(DatasetError::DuplicateColumn(column.name));
        }
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.n_rows {
            return Err(DatasetError::LengthMismatch {
                column: column.name,
                expected: self.n_rows,
                actual,
            });
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        self.columns.push(column);
        Ok(())
    }

    /// Numeric matrix of the named columns, in the given order.
    pub fn to_array(&self, names: &[String]) -> Result<Array2<f64>, DatasetError> {
        let mut out = Array2::<f64>::zeros((self.n_rows, names.len()));
        for (j, name) in names.iter().enumerate() {
            let column = self
                .column(name)
                .ok_or_else(|| DatasetError::MissingColumn(name.clone()))?;
            let values = column.data.to_f64().ok_or_else(|| DatasetError::NonNumeric {
                column: name.clone(),
                dtype: column.dtype().to_string(),
            })?;
            for (i, v) in values.into_iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(out)
    }

    /// Build a frame from source documents.
    ///
    /// Columns appear in first-seen key order. The document id field is
    /// dropped and `"na"` strings are treated as missing, which turns an
    /// otherwise numeric column into `float64` with NaN holes.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, DatasetError> {
        let mut names: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for key in record.keys() {
                if key != DOCUMENT_ID_FIELD && seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let cells: Vec<Cell> = records.iter().map(|r| Cell::from(r.get(name))).collect();
                Column::new(name, infer_column(&cells))
            })
            .collect();

        DataFrame::new(columns)
    }
}

enum Cell<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
    Nested(&'a Value),
}

impl<'a> From<Option<&'a Value>> for Cell<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Null,
            Some(Value::Bool(b)) => Cell::Bool(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => Cell::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(Value::String(s)) if s == MISSING_MARKER => Cell::Null,
            Some(Value::String(s)) => Cell::Text(s),
            Some(other) => Cell::Nested(other),
        }
    }
}

fn infer_column(cells: &[Cell]) -> ColumnData {
    let has_null = cells.iter().any(|c| matches!(c, Cell::Null));
    let all_bool = cells.iter().all(|c| matches!(c, Cell::Bool(_)));
    let all_int = cells.iter().all(|c| matches!(c, Cell::Int(_)));
    let all_numeric = cells
        .iter()
        .all(|c| matches!(c, Cell::Int(_) | Cell::Float(_) | Cell::Null));

    if !cells.is_empty() && all_bool {
        return ColumnData::Bool(
            cells
                .iter()
                .map(|c| matches!(c, Cell::Bool(true)))
                .collect(),
        );
    }
    if !has_null && all_int {
        return ColumnData::Int64(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Int(i) => *i,
                    _ => 0,
                })
                .collect(),
        );
    }
    if all_numeric {
        return ColumnData::Float64(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Int(i) => *i as f64,
                    Cell::Float(f) => *f,
                    _ => f64::NAN,
                })
                .collect(),
        );
    }
    ColumnData::Object(
        cells
            .iter()
            .map(|c| match c {
                Cell::Null => String::new(),
                Cell::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
                Cell::Int(i) => i.to_string(),
                Cell::Float(f) => f.to_string(),
                Cell::Text(s) => s.to_string(),
                Cell::Nested(v) => v.to_string(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Map<String, Value>> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_from_records_infers_dtypes() {
        let recs = records(vec![
            json!({"_id": "a1", "Age": 30, "Premium": 1200.5, "Gender": "Male", "Insured": true}),
            json!({"_id": "a2", "Age": 41, "Premium": 980, "Gender": "Female", "Insured": false}),
        ]);
        let df = DataFrame::from_records(&recs).unwrap();

        assert_eq!(df.n_rows(), 2);
        assert!(!df.has_column("_id"));
        assert_eq!(df.column("Age").unwrap().dtype(), Dtype::Int64);
        assert_eq!(df.column("Premium").unwrap().dtype(), Dtype::Float64);
        assert_eq!(df.column("Gender").unwrap().dtype(), Dtype::Object);
        assert_eq!(df.column("Insured").unwrap().dtype(), Dtype::Bool);
    }

    #[test]
    fn test_missing_marker_turns_int_into_float() {
        let recs = records(vec![json!({"Age": 30}), json!({"Age": "na"})]);
        let df = DataFrame::from_records(&recs).unwrap();
        let column = df.column("Age").unwrap();
        assert_eq!(column.dtype(), Dtype::Float64);
        match &column.data {
            ColumnData::Float64(v) => {
                assert_eq!(v[0], 30.0);
                assert!(v[1].is_nan());
            }
            other => panic!("unexpected column data: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_and_length_checks() {
        let dup = DataFrame::new(vec![
            Column::new("a", ColumnData::Int64(vec![1])),
            Column::new("a", ColumnData::Int64(vec![2])),
        ]);
        assert!(matches!(dup, Err(DatasetError::DuplicateColumn(_))));

        let uneven = DataFrame::new(vec![
            Column::new("a", ColumnData::Int64(vec![1, 2])),
            Column::new("b", ColumnData::Int64(vec![3])),
        ]);
        assert!(matches!(uneven, Err(DatasetError::LengthMismatch { .. })));
    }

    #[test]
    fn test_push_column_length_mismatch_reports_sizes() {
        let mut df = DataFrame::new(vec![Column::new("a", ColumnData::Int64(vec![1, 2]))]).unwrap();
        let err = df
            .push_column(Column::new("b", ColumnData::Int64(vec![3, 4, 5])))
            .unwrap_err();
        match err {
            DatasetError::LengthMismatch {
                column,
                expected,
                actual,
            } => {
                assert_eq!(column, "b");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(df.n_cols(), 1);
    }

    #[test]
    fn test_take_drop_split() {
        let df = DataFrame::new(vec![
            Column::new("x", ColumnData::Int64(vec![10, 20, 30])),
            Column::new("y", ColumnData::Object(vec!["a".into(), "b".into(), "c".into()])),
            Column::new("t", ColumnData::Int64(vec![0, 1, 0])),
        ])
        .unwrap();

        let taken = df.take_rows(&[2, 0]);
        assert_eq!(taken.n_rows(), 2);
        assert_eq!(taken.column("x").unwrap().data, ColumnData::Int64(vec![30, 10]));

        let dropped = df.drop_columns(&["y".to_string(), "missing".to_string()]);
        assert_eq!(dropped.column_names(), vec!["x", "t"]);

        let (features, target) = df.split_column("t").unwrap();
        assert_eq!(features.n_cols(), 2);
        assert_eq!(target.name, "t");
    }

    #[test]
    fn test_to_array_rejects_object_columns() {
        let df = DataFrame::new(vec![
            Column::new("x", ColumnData::Int64(vec![1, 2])),
            Column::new("flag", ColumnData::Bool(vec![true, false])),
            Column::new("s", ColumnData::Object(vec!["a".into(), "b".into()])),
        ])
        .unwrap();

        let arr = df.to_array(&["flag".to_string(), "x".to_string()]).unwrap();
        assert_eq!(arr[[0, 0]], 1.0);
        assert_eq!(arr[[1, 1]], 2.0);

        let err = df.to_array(&["s".to_string()]).unwrap_err();
        assert!(matches!(err, DatasetError::NonNumeric { .. }));
    }

    #[test]
    fn test_float_cells_keep_decimal_point() {
        let data = ColumnData::Float64(vec![1.0, f64::NAN]);
        assert_eq!(data.cell_string(0), "1.0");
        assert_eq!(data.cell_string(1), "NaN");
    }
}
