use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::StageError;

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)
        .map_err(|e| StageError::Persistence(format!("{}: {}", path.display(), e)))
}

/// Read a JSON artifact written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StageError> {
    let bytes = std::fs::read(path)
        .map_err(|e| StageError::Persistence(format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StageError::Persistence(format!("{}: {}", path.display(), e)))
}
