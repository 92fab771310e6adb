//! Prometheus metrics for pipeline components.
//!
//! Collectors are process-wide statics; the binary registers them through
//! [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline runs
// =============================================================================

/// Completed runs by outcome.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mlgate_runs_total", "Total pipeline runs by outcome"),
        &["outcome"], // "promoted", "not_accepted", "validation_halted", "training_rejected", "error"
    )
    .unwrap()
});

/// Wall time spent in each stage.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mlgate_stage_duration_seconds",
            "Duration of each pipeline stage",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Collaborators
// =============================================================================

/// Source reads retried after a transient failure.
pub static SOURCE_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mlgate_source_retries_total",
        "Total source fetch retries after transient failures",
    )
    .unwrap()
});

/// Objects written to the registry store.
pub static REGISTRY_UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mlgate_registry_uploads_total",
            "Objects uploaded to the registry store",
        ),
        &["kind"], // "artifact", "log", "model"
    )
    .unwrap()
});

// =============================================================================
// Models
// =============================================================================

/// Test accuracy of the currently promoted champion.
pub static CHAMPION_ACCURACY: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "mlgate_champion_accuracy",
        "Held-out accuracy of the last promoted model",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RUNS_TOTAL.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(SOURCE_RETRIES.clone()),
        Box::new(REGISTRY_UPLOADS.clone()),
        Box::new(CHAMPION_ACCURACY.clone()),
    ]
}
