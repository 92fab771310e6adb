use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Split ratio and score thresholds are proper fractions
/// - Classifier hyperparameters are usable
/// - Resampler neighbour counts are non-zero
/// - Registry key is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let ratio = config.ingestion.test_ratio;
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(invalid(format!(
            "ingestion.test_ratio must be in (0, 1), got {}",
            ratio
        )));
    }

    let trainer = &config.trainer;
    if trainer.n_estimators == 0 {
        return Err(invalid("trainer.n_estimators cannot be 0".to_string()));
    }
    if trainer.max_depth == 0 {
        return Err(invalid("trainer.max_depth cannot be 0".to_string()));
    }
    if trainer.min_samples_split < 2 {
        return Err(invalid(
            "trainer.min_samples_split must be at least 2".to_string(),
        ));
    }
    if trainer.min_samples_leaf == 0 {
        return Err(invalid(
            "trainer.min_samples_leaf must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&trainer.accuracy_floor) {
        return Err(invalid(format!(
            "trainer.accuracy_floor must be in [0, 1], got {}",
            trainer.accuracy_floor
        )));
    }

    let threshold = config.evaluation.acceptance_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid(format!(
            "evaluation.acceptance_threshold must be in [0, 1], got {}",
            threshold
        )));
    }

    if config.transformation.smote_k_neighbors == 0 || config.transformation.enn_k_neighbors == 0
    {
        return Err(invalid(
            "transformation neighbour counts cannot be 0".to_string(),
        ));
    }

    if config.registry.model_key.trim().is_empty() {
        return Err(invalid("registry.model_key cannot be empty".to_string()));
    }
    if config.registry.bucket.trim().is_empty() {
        return Err(invalid("registry.bucket cannot be empty".to_string()));
    }

    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0".to_string()));
    }

    Ok(())
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}
