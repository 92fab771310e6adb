//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the two I/O collaborators (the document source and the
//! object store) so a whole pipeline run can execute in-process.
//!
//! # Example
//!
//! ```rust,ignore
//! use mlgate_core::testing::{fixtures, MemoryObjectStore, MockSource};
//!
//! let source = MockSource::new();
//! source.set_documents(fixtures::insurance_documents(200, 7)).await;
//! let store = MemoryObjectStore::new();
//!
//! // Build a TrainingPipeline over Arc::new(source), Arc::new(store)...
//! ```

mod memory_store;
mod mock_source;

pub use memory_store::{MemoryObjectStore, RecordedPut};
pub use mock_source::{MockSource, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use serde_json::{json, Value};

    use crate::artifact::{write_json, IngestionArtifact, RunLayout, TransformationArtifact};
    use crate::dataset::{write_csv, DataFrame};
    use crate::model::{MetricRecord, ModelBundle, RandomForest};
    use crate::schema::Schema;
    use crate::trainer::TrainerConfig;
    use crate::transform::{DataTransformation, TransformationConfig};

    /// Schema for the vehicle insurance cross-sell data.
    pub const SCHEMA_YAML: &str = r#"
columns:
  - id: int
  - Gender: object
  - Age: int
  - Driving_License: int
  - Region_Code: float
  - Previously_Insured: int
  - Vehicle_Age: object
  - Vehicle_Damage: object
  - Annual_Premium: float
  - Policy_Sales_Channel: float
  - Vintage: int
  - Response: int

numerical_columns:
  - Age
  - Driving_License
  - Region_Code
  - Previously_Insured
  - Annual_Premium
  - Policy_Sales_Channel
  - Vintage

categorical_columns:
  - Gender
  - Vehicle_Age
  - Vehicle_Damage

drop_columns:
  - id

target_columns:
  - Response

num_columns:
  - Age
  - Vintage

mm_columns:
  - Annual_Premium
"#;

    pub fn insurance_schema() -> Schema {
        Schema::from_yaml_str(SCHEMA_YAML).expect("fixture schema is valid")
    }

    /// `n` synthetic policy-holder documents, deterministic per `seed`.
    ///
    /// Response is 1 exactly when the vehicle was damaged and the holder was
    /// not previously insured, roughly 30% of rows. Rows 0 and 1 are pinned
    /// to one positive and one negative so both classes are always present.
    pub fn insurance_documents(n: usize, seed: u64) -> Vec<Value> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let (damaged, previously_insured) = match i {
                    0 => (true, 0),
                    1 => (false, 1),
                    _ => (rng.gen_bool(0.5), i64::from(rng.gen_bool(0.4))),
                };
                let response = i64::from(damaged && previously_insured == 0);
                let vehicle_age = ["< 1 Year", "1-2 Year", "> 2 Years"][rng.gen_range(0..3)];
                json!({
                    "_id": format!("doc-{}-{}", seed, i),
                    "id": i as i64 + 1,
                    "Gender": if rng.gen_bool(0.5) { "Male" } else { "Female" },
                    "Age": rng.gen_range(20..80_i64),
                    "Driving_License": i64::from(rng.gen_bool(0.95)),
                    "Region_Code": rng.gen_range(0..53) as f64,
                    "Previously_Insured": previously_insured,
                    "Vehicle_Age": vehicle_age,
                    "Vehicle_Damage": if damaged { "Yes" } else { "No" },
                    "Annual_Premium": rng.gen_range(2630..60000) as f64 + 0.5,
                    "Policy_Sales_Channel": rng.gen_range(1..160) as f64,
                    "Vintage": rng.gen_range(10..300_i64),
                    "Response": response,
                })
            })
            .collect()
    }

    /// [`insurance_documents`] as a frame, without the `_id` field.
    pub fn insurance_frame(n: usize, seed: u64) -> DataFrame {
        let records: Vec<_> = insurance_documents(n, seed)
            .into_iter()
            .filter_map(|d| d.as_object().cloned())
            .collect();
        DataFrame::from_records(&records).expect("fixture records form a frame")
    }

    /// Write train and test CSVs into `layout` as the ingestion stage would.
    pub fn ingestion_artifact(
        layout: &RunLayout,
        n_train: usize,
        n_test: usize,
        seed: u64,
    ) -> IngestionArtifact {
        let train = insurance_frame(n_train, seed);
        let test = insurance_frame(n_test, seed.wrapping_add(1));
        write_csv(&train, &layout.train_file()).expect("write train csv");
        write_csv(&test, &layout.test_file()).expect("write test csv");
        IngestionArtifact {
            feature_store_path: layout.feature_store_file(),
            train_path: layout.train_file(),
            test_path: layout.test_file(),
            train_rows: n_train,
            test_rows: n_test,
        }
    }

    /// Fit the preprocessor on `n` rows and persist it with both splits.
    pub fn transformation_artifact(
        layout: &RunLayout,
        n: usize,
        seed: u64,
    ) -> TransformationArtifact {
        let schema = insurance_schema();
        let config = TransformationConfig::default();
        let transformation = DataTransformation::new(&schema, &config);
        let (preprocessor, train) = transformation
            .fit_transform_train(insurance_frame(n, seed))
            .expect("fit fixture preprocessor");
        let test = transformation
            .transform_test(&preprocessor, insurance_frame(n / 3 + 2, seed.wrapping_add(1)))
            .expect("transform fixture test split");

        let artifact = TransformationArtifact {
            preprocessor_path: layout.preprocessor_file(),
            transformed_train_path: layout.transformed_train_file(),
            transformed_test_path: layout.transformed_test_file(),
            train_rows: train.n_rows(),
            test_rows: test.n_rows(),
        };
        write_json(&artifact.preprocessor_path, &preprocessor).expect("write preprocessor");
        write_json(&artifact.transformed_train_path, &train).expect("write train split");
        write_json(&artifact.transformed_test_path, &test).expect("write test split");
        artifact
    }

    /// A small fitted bundle trained on `n` fixture rows.
    pub fn trained_bundle(n: usize, seed: u64) -> ModelBundle {
        let schema = insurance_schema();
        let config = TransformationConfig {
            random_seed: seed,
            ..TransformationConfig::default()
        };
        let transformation = DataTransformation::new(&schema, &config);
        let (preprocessor, train) = transformation
            .fit_transform_train(insurance_frame(n, seed))
            .expect("fit fixture preprocessor");
        let test = transformation
            .transform_test(&preprocessor, insurance_frame(n / 3 + 2, seed.wrapping_add(1)))
            .expect("transform fixture test split");

        let trainer = TrainerConfig {
            n_estimators: 15,
            random_seed: seed,
            ..TrainerConfig::default()
        };
        let classifier =
            RandomForest::fit(train.features(), &train.targets(), &trainer.forest_params())
                .expect("fit fixture forest");
        let predicted = classifier
            .predict(test.features())
            .expect("predict fixture split");
        let metrics = MetricRecord::score(&test.targets(), &predicted);
        ModelBundle::new(preprocessor, classifier, metrics, &format!("fixture_{}", seed))
    }
}
