use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::config::IngestionConfig;
use crate::artifact::{IngestionArtifact, RunLayout};
use crate::dataset::{write_csv, DataFrame};
use crate::error::StageError;
use crate::source::{fetch_with_retry, SourceConfig, SourceConnector};

/// Exports the source collection to the feature store and splits it.
pub struct DataIngestion<'a> {
    config: &'a IngestionConfig,
    source_config: &'a SourceConfig,
}

impl<'a> DataIngestion<'a> {
    pub fn new(config: &'a IngestionConfig, source_config: &'a SourceConfig) -> Self {
        Self {
            config,
            source_config,
        }
    }

    /// Read the collection and persist it unchanged as the feature store file.
    pub async fn export_to_feature_store(
        &self,
        source: &dyn SourceConnector,
        layout: &RunLayout,
    ) -> Result<DataFrame, StageError> {
        let records = fetch_with_retry(
            source,
            &self.source_config.collection,
            &self.source_config.database,
            &self.source_config.retry,
        )
        .await?;

        let frame = DataFrame::from_records(&records)?;
        if frame.n_rows() == 0 {
            return Err(StageError::Data(format!(
                "collection '{}' is empty",
                self.source_config.collection
            )));
        }

        let path = layout.feature_store_file();
        write_csv(&frame, &path)?;
        info!(
            rows = frame.n_rows(),
            columns = frame.n_cols(),
            path = %path.display(),
            "Exported collection to feature store"
        );
        Ok(frame)
    }

    /// Shuffle with the configured seed and cut into (train, test).
    pub fn split(&self, frame: &DataFrame) -> Result<(DataFrame, DataFrame), StageError> {
        let (train_idx, test_idx) =
            split_indices(frame.n_rows(), self.config.test_ratio, self.config.random_seed)?;
        Ok((frame.take_rows(&train_idx), frame.take_rows(&test_idx)))
    }

    /// Export, split and persist both partitions.
    pub async fn run(
        &self,
        source: &dyn SourceConnector,
        layout: &RunLayout,
    ) -> Result<IngestionArtifact, StageError> {
        let frame = self.export_to_feature_store(source, layout).await?;
        let (train, test) = self.split(&frame)?;

        let train_path = layout.train_file();
        let test_path = layout.test_file();
        write_csv(&train, &train_path)?;
        write_csv(&test, &test_path)?;
        debug!(train = train.n_rows(), test = test.n_rows(), "Wrote ingested partitions");

        Ok(IngestionArtifact {
            feature_store_path: layout.feature_store_file(),
            train_path,
            test_path,
            train_rows: train.n_rows(),
            test_rows: test.n_rows(),
        })
    }
}

/// Seeded shuffle split of `n` row indices.
///
/// The test side takes `ceil(n * test_ratio)` rows from the front of the
/// permutation; both sides are guaranteed non-empty.
pub fn split_indices(
    n: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), StageError> {
    if n < 2 {
        return Err(StageError::Data(format!(
            "need at least 2 rows to split, got {}",
            n
        )));
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(StageError::Configuration(format!(
            "test ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }

    let n_test = ((n as f64) * test_ratio).ceil() as usize;
    let n_test = n_test.clamp(1, n - 1);

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation[n_test..].to_vec();
    let mut test = permutation;
    test.truncate(n_test);
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSource};
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_split_ratio_and_disjointness() {
        let (train, test) = split_indices(100, 0.25, 42).unwrap();
        assert_eq!(test.len(), 25);
        assert_eq!(train.len(), 75);

        let all: HashSet<usize> = train.iter().chain(test.iter()).copied().collect();
        assert_eq!(all.len(), 100);
    }

    #[test]
    fn test_split_rounds_test_side_up() {
        let (train, test) = split_indices(10, 0.25, 1).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let a = split_indices(50, 0.3, 7).unwrap();
        let b = split_indices(50, 0.3, 7).unwrap();
        let c = split_indices(50, 0.3, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_rejects_tiny_input() {
        assert!(matches!(split_indices(1, 0.25, 42), Err(StageError::Data(_))));
    }

    #[tokio::test]
    async fn test_run_writes_partitions() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "01_01_2026_00_00_00");
        let source = MockSource::new();
        source.set_documents(fixtures::insurance_documents(40, 3)).await;

        let config = IngestionConfig::default();
        let source_config = SourceConfig::default();
        let artifact = DataIngestion::new(&config, &source_config)
            .run(&source, &layout)
            .await
            .unwrap();

        assert_eq!(artifact.test_rows, 10);
        assert_eq!(artifact.train_rows, 30);
        assert!(artifact.feature_store_path.is_file());
        assert!(artifact.train_path.is_file());
        assert!(artifact.test_path.is_file());

        let train = crate::dataset::read_csv(&artifact.train_path).unwrap();
        assert!(!train.has_column("_id"));
    }

    #[tokio::test]
    async fn test_empty_collection_is_data_error() {
        let dir = TempDir::new().unwrap();
        let layout = RunLayout::new(dir.path(), "ts");
        let source = MockSource::new();

        let config = IngestionConfig::default();
        let source_config = SourceConfig::default();
        let err = DataIngestion::new(&config, &source_config)
            .run(&source, &layout)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Data(_)));
    }
}
