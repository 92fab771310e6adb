//! Trait definitions for the source module.

use async_trait::async_trait;

use super::error::SourceError;

/// One document from the source collection.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A connector that can read a whole collection.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Returns the name of this connector implementation.
    fn name(&self) -> &str;

    /// Read every document of `collection` in `database`.
    async fn fetch_collection(
        &self,
        collection: &str,
        database: &str,
    ) -> Result<Vec<Record>, SourceError>;
}
