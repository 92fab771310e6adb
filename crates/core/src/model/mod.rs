//! Tree-ensemble classifier, scoring, and the persisted model bundle.

mod bundle;
mod error;
mod forest;
mod metrics;
mod tree;

pub use bundle::{fingerprint, ModelBundle, BUNDLE_FORMAT_VERSION};
pub use error::ModelError;
pub use forest::{ForestParams, RandomForest};
pub use metrics::MetricRecord;
pub use tree::{Criterion, DecisionTree, TreeNode, TreeParams};
