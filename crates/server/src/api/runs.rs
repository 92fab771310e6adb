//! Run history handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mlgate_core::state::RunRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Maximum allowed limit for run queries
const MAX_LIMIT: usize = 500;

/// Default limit for run queries
const DEFAULT_LIMIT: usize = 50;

/// Query parameters for listing runs
#[derive(Debug, Deserialize)]
pub struct ListRunsParams {
    pub limit: Option<usize>,
}

/// Response for listing runs
#[derive(Debug, Serialize)]
pub struct ListRunsResponse {
    pub runs: Vec<RunRecord>,
    pub limit: usize,
}

/// List recent runs, newest first.
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRunsParams>,
) -> Result<Json<ListRunsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let runs = state.run_store().list_runs(limit).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;
    Ok(Json(ListRunsResponse { runs, limit }))
}

/// Get a single run by id.
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.run_store().get_run(&id) {
        Ok(Some(run)) => Ok(Json(run)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Run not found: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}
