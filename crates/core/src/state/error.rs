use thiserror::Error;

/// Errors raised by a run store.
#[derive(Debug, Error)]
pub enum RunStoreError {
    #[error("Run store database error: {0}")]
    Database(String),

    #[error("Run store lock poisoned")]
    LockPoisoned,

    #[error("Corrupt run store entry: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for RunStoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}
