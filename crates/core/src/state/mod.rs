//! Run history and small versioned pipeline state.
//!
//! Replaces any form of self-rewriting configuration: values that must
//! survive across runs (such as the accuracy of the last promoted model)
//! live here as versioned entries.

mod error;
mod sqlite_store;
mod types;

pub use error::RunStoreError;
pub use sqlite_store::SqliteRunStore;
pub use types::{RunRecord, RunStore, StateEntry, EXPECTED_ACCURACY_KEY};
