//! Tabular row sets moved between pipeline stages.
//!
//! A `DataFrame` is an ordered list of typed columns. Column storage types
//! (`Dtype`) are inferred once, when records are fetched from the source or
//! when a CSV partition is read back, and are what the validator checks
//! against the declared schema.

mod csv_io;
mod error;
mod frame;

pub use csv_io::{read_csv, write_csv};
pub use error::DatasetError;
pub use frame::{Column, ColumnData, DataFrame, Dtype};
