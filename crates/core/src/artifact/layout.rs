use std::path::{Path, PathBuf};

/// Paths of every artifact a run writes, rooted at `<artifact_dir>/<timestamp>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    timestamp: String,
    root: PathBuf,
}

impl RunLayout {
    pub fn new(artifact_dir: &Path, timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            root: artifact_dir.join(timestamp),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn feature_store_file(&self) -> PathBuf {
        self.root
            .join("data_ingestion")
            .join("feature_store")
            .join("data.csv")
    }

    pub fn train_file(&self) -> PathBuf {
        self.ingested_dir().join("train.csv")
    }

    pub fn test_file(&self) -> PathBuf {
        self.ingested_dir().join("test.csv")
    }

    pub fn validation_report(&self) -> PathBuf {
        self.root.join("data_validation").join("report.json")
    }

    pub fn transformed_train_file(&self) -> PathBuf {
        self.transformed_dir().join("train.json")
    }

    pub fn transformed_test_file(&self) -> PathBuf {
        self.transformed_dir().join("test.json")
    }

    pub fn preprocessor_file(&self) -> PathBuf {
        self.root
            .join("data_transformation")
            .join("transformed_object")
            .join("preprocessing.json")
    }

    pub fn trained_model_file(&self) -> PathBuf {
        self.root
            .join("model_trainer")
            .join("trained_model")
            .join("model.json")
    }

    fn ingested_dir(&self) -> PathBuf {
        self.root.join("data_ingestion").join("ingested")
    }

    fn transformed_dir(&self) -> PathBuf {
        self.root.join("data_transformation").join("transformed")
    }
}
