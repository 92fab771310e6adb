//! Object store seam used by the model registry.
//!
//! Keys are forward-slash-delimited strings. "Folders" are a naming
//! convention only; [`ObjectStore::list`] is a plain prefix match.

mod error;
mod fs_store;
mod traits;

pub use error::StorageError;
pub use fs_store::FsObjectStore;
pub use traits::{validate_key, ObjectStore};
