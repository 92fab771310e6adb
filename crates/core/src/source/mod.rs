//! Source connector: reads a named document collection into records.
//!
//! The document-store driver itself is an external collaborator; this module
//! defines the narrow [`SourceConnector`] seam, a JSON dump implementation,
//! and the bounded fixed-delay retry applied to transient failures.

mod config;
mod error;
mod json_source;
mod retry;
mod traits;

pub use config::{RetryConfig, SourceConfig};
pub use error::SourceError;
pub use json_source::JsonDocumentSource;
pub use retry::fetch_with_retry;
pub use traits::{Record, SourceConnector};
