//! Declared column contract for the source collection.
//!
//! The schema is a YAML document loaded once per run and treated as read-only
//! configuration by the validator and the transformer.

mod error;
mod types;

pub use error::SchemaError;
pub use types::{encoded_column_name, is_dtype_compatible, load_schema, ColumnSpec, Schema};
