//! Schema gate over the ingested partitions.

mod validator;

pub use validator::{ColumnPresence, DataValidation, DtypeMismatch, ValidationReport};
