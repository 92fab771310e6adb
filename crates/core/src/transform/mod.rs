//! Feature transformation.
//!
//! Train side: drop, one-hot encode, rebalance with SMOTE+ENN, fit and apply
//! the column scaler. Test side: the same drop and encode, then the already
//! fitted scaler. The fitted pieces are persisted together as a
//! [`Preprocessor`] and never refit afterwards.

mod config;
mod encoder;
mod error;
mod preprocessor;
mod resample;
mod scaler;
mod transformer;

pub use config::{EnnSelection, TransformationConfig};
pub use encoder::{EncodedCategory, OneHotEncoder};
pub use error::TransformError;
pub use preprocessor::Preprocessor;
pub use resample::{class_counts, SmoteEnn};
pub use scaler::{ColumnScaler, ScaleKind, ScaledColumn};
pub use transformer::{target_vector, DataTransformation, TransformedSplit};
