//! Training trigger handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mlgate_core::{RunOutcome, Stage};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::handlers::ErrorResponse;
use crate::metrics::TRAIN_CONFLICTS_TOTAL;
use crate::state::AppState;

/// Body returned when a run aborts with an error.
#[derive(Debug, Serialize)]
pub struct RunFailedResponse {
    pub error: String,
    pub stage: Stage,
    pub kind: &'static str,
}

/// Run one training pipeline.
///
/// One run at a time per process: a request arriving while another run holds
/// the lock is refused with 409. Gate outcomes (validation halt, floor
/// rejection) come back as 422 with the run report.
pub async fn trigger_run(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(_guard) = state.train_lock().try_lock() else {
        TRAIN_CONFLICTS_TOTAL.inc();
        warn!("Training run requested while another run is in progress");
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("a training run is already in progress")),
        )
            .into_response();
    };

    match state.pipeline().run().await {
        Ok(report) => {
            if report.outcome == RunOutcome::Promoted {
                state.predictor().invalidate().await;
                info!(run_id = %report.run_id, "New champion promoted; serving cache cleared");
            }
            let status = if report.outcome.is_success() {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            (status, Json(report)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RunFailedResponse {
                error: e.to_string(),
                stage: e.stage,
                kind: e.source.kind(),
            }),
        )
            .into_response(),
    }
}
