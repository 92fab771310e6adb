use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::error::SchemaError;
use crate::dataset::Dtype;

/// One declared column and its expected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: String,
}

/// Declared column contract.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    /// Every column the partitions must carry, in declaration order.
    #[serde(deserialize_with = "deserialize_columns")]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    #[serde(default)]
    pub target_columns: Vec<String>,
    /// Columns scaled to zero mean and unit variance.
    #[serde(default, alias = "num_columns")]
    pub standardize_columns: Vec<String>,
    /// Columns scaled into [0, 1].
    #[serde(default, alias = "mm_columns")]
    pub min_max_columns: Vec<String>,
    /// Known levels per categorical column, in encoding order.
    #[serde(default)]
    pub categorical_levels: BTreeMap<String, Vec<String>>,
}

impl Schema {
    /// Parse and check a schema from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let schema: Schema =
            serde_yaml::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))?;
        schema.check()?;
        Ok(schema)
    }

    /// Enforce the structural rules: exactly one target, disjoint role lists.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::Invalid("columns must not be empty".to_string()));
        }
        if self.target_columns.len() != 1 {
            return Err(SchemaError::Invalid(format!(
                "exactly one target column is required, found {}",
                self.target_columns.len()
            )));
        }

        check_disjoint(&[
            ("numerical_columns", &self.numerical_columns),
            ("categorical_columns", &self.categorical_columns),
            ("drop_columns", &self.drop_columns),
            ("target_columns", &self.target_columns),
        ])?;
        check_disjoint(&[
            ("standardize_columns", &self.standardize_columns),
            ("min_max_columns", &self.min_max_columns),
        ])?;

        for column in self.categorical_levels.keys() {
            if !self.categorical_columns.contains(column) {
                return Err(SchemaError::Invalid(format!(
                    "levels declared for non-categorical column '{}'",
                    column
                )));
            }
        }

        Ok(())
    }

    /// The single target column name.
    pub fn target_column(&self) -> Result<&str, SchemaError> {
        match self.target_columns.as_slice() {
            [target] => Ok(target.as_str()),
            other => Err(SchemaError::Invalid(format!(
                "exactly one target column is required, found {}",
                other.len()
            ))),
        }
    }

    /// Declared levels for a categorical column, if any.
    pub fn levels_for(&self, column: &str) -> Option<&[String]> {
        self.categorical_levels.get(column).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

fn check_disjoint(lists: &[(&str, &Vec<String>)]) -> Result<(), SchemaError> {
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for &(list_name, columns) in lists {
        for column in columns {
            if let Some(previous) = owner.insert(column.as_str(), list_name) {
                if previous != list_name {
                    return Err(SchemaError::Invalid(format!(
                        "column '{}' appears in both {} and {}",
                        column, previous, list_name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Load and check a schema document from disk.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    if !path.exists() {
        return Err(SchemaError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Schema::from_yaml_str(&content)
}

/// Whether a column's storage type satisfies its declared type.
///
/// `int` and `float` accept both widths; anything else must match the storage
/// name exactly.
pub fn is_dtype_compatible(declared: &str, actual: Dtype) -> bool {
    let accepted: &[&str] = match declared {
        "int" => &["int64", "int32"],
        "float" => &["float64", "float32"],
        "object" => &["object"],
        "bool" => &["bool"],
        other => return other == actual.as_str(),
    };
    accepted.contains(&actual.as_str())
}

/// Stable name for the one-hot column of `level` within `column`.
///
/// `<` and `>` become `lt` and `gt`; any other run of non-alphanumeric
/// characters collapses to a single underscore.
pub fn encoded_column_name(column: &str, level: &str) -> String {
    let spelled = level.replace('<', "lt").replace('>', "gt");
    let mut sanitized = String::with_capacity(spelled.len());
    let mut pending_sep = false;
    for ch in spelled.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !sanitized.is_empty() {
                sanitized.push('_');
            }
            pending_sep = false;
            sanitized.push(ch);
        } else {
            pending_sep = true;
        }
    }
    format!("{}_{}", column, sanitized)
}

fn deserialize_columns<'de, D>(deserializer: D) -> Result<Vec<ColumnSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_yaml::Value::deserialize(deserializer)?;
    let mut columns = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |key: &serde_yaml::Value, ty: &serde_yaml::Value| -> Result<(), D::Error> {
        let name = key
            .as_str()
            .ok_or_else(|| D::Error::custom("column names must be strings"))?;
        let declared_type = ty
            .as_str()
            .ok_or_else(|| D::Error::custom(format!("type of column '{}' must be a string", name)))?;
        if !seen.insert(name.to_string()) {
            return Err(D::Error::custom(format!("duplicate column '{}'", name)));
        }
        columns.push(ColumnSpec {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
        });
        Ok(())
    };

    match &value {
        serde_yaml::Value::Mapping(map) => {
            for (key, ty) in map {
                push(key, ty)?;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                let map = item
                    .as_mapping()
                    .filter(|m| m.len() == 1)
                    .ok_or_else(|| D::Error::custom("column list entries must be single-entry maps"))?;
                for (key, ty) in map {
                    push(key, ty)?;
                }
            }
        }
        _ => return Err(D::Error::custom("columns must be a mapping or a list")),
    }

    Ok(columns)
}
