//! Champion prediction handler.

use axum::{extract::State, http::StatusCode, Json};
use mlgate_core::dataset::DataFrame;
use mlgate_core::model::ModelError;
use mlgate_core::PredictError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Prediction for one record.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted class label.
    pub prediction: i64,
    /// Probability of class 1.
    pub probability: f64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Score one raw record with the current champion.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Value::Object(record) = body else {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "request body must be a single JSON object",
        ));
    };
    let frame = DataFrame::from_records(&[record])
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let predictions = state.predictor().predict(&frame).await.map_err(|e| match e {
        PredictError::NoChampion => api_error(StatusCode::NOT_FOUND, e.to_string()),
        PredictError::Model(ModelError::Transform(_) | ModelError::Dataset(_)) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        other => {
            error!(error = %other, "Prediction failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    })?;

    let (prediction, probability) = predictions.into_iter().next().ok_or_else(|| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "classifier returned no prediction")
    })?;
    Ok(Json(PredictResponse {
        prediction,
        probability,
    }))
}
