use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::registry::ModelRegistry;
use crate::artifact::{PusherArtifact, TrainerArtifact};
use crate::metrics;

/// Archives a run and promotes its bundle.
pub struct RegistryPusher<'a> {
    registry: &'a ModelRegistry,
    config: &'a RegistryConfig,
}

impl<'a> RegistryPusher<'a> {
    pub fn new(registry: &'a ModelRegistry, config: &'a RegistryConfig) -> Self {
        Self { registry, config }
    }

    /// Upload the run's artifact and log directories under timestamped
    /// archive prefixes, then overwrite the active model key.
    ///
    /// Archives are never overwritten: when `<prefix>/<ts>/` already holds
    /// objects the run archives under `<ts>_1`, `<ts>_2`, ... instead. The
    /// active key is written last, so a failure while archiving leaves the
    /// previous champion in place.
    pub async fn push(
        &self,
        trainer: &TrainerArtifact,
        artifact_root: &Path,
        logs_dir: &Path,
        run_timestamp: &str,
    ) -> Result<PusherArtifact, RegistryError> {
        let archive_id = self.free_archive_id(run_timestamp).await?;
        let mut archived_keys = self
            .upload_dir(
                artifact_root,
                &format!("{}/{}", self.config.artifact_prefix, archive_id),
                "artifact",
            )
            .await?;
        archived_keys.extend(
            self.upload_dir(
                logs_dir,
                &format!("{}/{}", self.config.logs_prefix, archive_id),
                "log",
            )
            .await?,
        );

        let bytes = read_local(&trainer.bundle_path).await?;
        self.registry.promote(bytes).await?;
        metrics::REGISTRY_UPLOADS.with_label_values(&["model"]).inc();

        info!(
            bucket = %self.config.bucket,
            key = %self.registry.model_key(),
            archive = %archive_id,
            archived = archived_keys.len(),
            "Pushed model to registry"
        );
        Ok(PusherArtifact {
            bucket: self.config.bucket.clone(),
            model_key: self.registry.model_key().to_string(),
            archive_id,
            archived_keys,
        })
    }

    /// First of `ts`, `ts_1`, `ts_2`, ... with no objects under either
    /// archive prefix.
    async fn free_archive_id(&self, run_timestamp: &str) -> Result<String, RegistryError> {
        let mut candidate = run_timestamp.to_string();
        let mut suffix = 0u32;
        while self.archive_in_use(&candidate).await? {
            suffix += 1;
            candidate = format!("{}_{}", run_timestamp, suffix);
        }
        if suffix > 0 {
            warn!(
                run_timestamp,
                archive = %candidate,
                "Archive prefix already in use; disambiguating"
            );
        }
        Ok(candidate)
    }

    async fn archive_in_use(&self, archive_id: &str) -> Result<bool, RegistryError> {
        for prefix in [&self.config.artifact_prefix, &self.config.logs_prefix] {
            let existing = self
                .registry
                .store()
                .list(&format!("{}/{}/", prefix, archive_id))
                .await?;
            if !existing.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn upload_dir(
        &self,
        dir: &Path,
        prefix: &str,
        kind: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let is_dir = tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            debug!(dir = %dir.display(), "Nothing to archive");
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for path in list_files(dir).await? {
            let relative = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let key = format!("{}/{}", prefix, relative);
            let bytes = read_local(&path).await?;
            self.registry.store().put(&key, bytes).await?;
            metrics::REGISTRY_UPLOADS.with_label_values(&[kind]).inc();
            keys.push(key);
        }
        Ok(keys)
    }
}

fn local_read(path: &Path) -> impl FnOnce(std::io::Error) -> RegistryError {
    let path = path.to_path_buf();
    move |source| RegistryError::LocalRead { path, source }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, RegistryError> {
    tokio::fs::read(path).await.map_err(local_read(path))
}

/// Every regular file under `dir`, sorted.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(local_read(&current))?;
        while let Some(entry) = entries.next_entry().await.map_err(local_read(&current))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(local_read(&path))?;
            if file_type.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
