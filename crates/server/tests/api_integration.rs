//! API integration tests.
//!
//! These tests drive the full router in-process against a real pipeline
//! backed by in-memory collaborators:
//! - Health, config and metrics endpoints
//! - Training trigger outcomes and the single-run lock
//! - Run history listing and lookup
//! - Champion serving before and after promotion

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{fixtures, TestFixture};

fn record_without_target(seed: u64) -> Value {
    let mut record = fixtures::insurance_documents(3, seed)
        .into_iter()
        .nth(2)
        .expect("fixture document");
    if let Some(map) = record.as_object_mut() {
        map.remove("Response");
        map.remove("_id");
    }
    record
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["trainer"]["n_estimators"], 15);
    assert!(response.body["source"]["connection_url_configured"].is_boolean());
    assert!(response.body["source"].get("connection_url").is_none());
}

#[tokio::test]
async fn test_train_promotes_first_model() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/train", json!({})).await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    assert_eq!(response.body["outcome"], "promoted");
    assert_eq!(response.body["pusher"]["model_key"], "model.json");
    assert!(fixture.store.keys().await.contains(&"model.json".to_string()));
}

#[tokio::test]
async fn test_second_identical_train_is_not_accepted() {
    let fixture = TestFixture::new().await;
    let first = fixture.post("/api/v1/train", json!({})).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = fixture.post("/api/v1/train", json!({})).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["outcome"], "not_accepted");
    assert_eq!(second.body["evaluation"]["accepted"], false);
}

#[tokio::test]
async fn test_train_conflicts_while_run_in_progress() {
    let fixture = TestFixture::new().await;
    let _guard = fixture.state.train_lock().lock().await;

    let response = fixture.post("/api/v1/train", json!({})).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("already in progress"));
    assert!(fixture.source.recorded_calls().await.is_empty());
}

#[tokio::test]
async fn test_train_validation_halt_is_unprocessable() {
    let documents = fixtures::insurance_documents(120, 3)
        .into_iter()
        .map(|mut d| {
            d.as_object_mut().unwrap().remove("Vintage");
            d
        })
        .collect();
    let fixture = TestFixture::with_documents(documents).await;

    let response = fixture.post("/api/v1/train", json!({})).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["outcome"], "validation_halted");
    assert!(response.body["message"].as_str().unwrap().contains("Columns are missing"));
    assert!(fixture.store.keys().await.is_empty());
}

#[tokio::test]
async fn test_train_below_floor_is_unprocessable() {
    let fixture = TestFixture::with_config(fixtures::insurance_documents(200, 11), |config| {
        config.trainer.accuracy_floor = 1.01;
    })
    .await;

    let response = fixture.post("/api/v1/train", json!({})).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["outcome"], "training_rejected");
    assert!(response.body["metrics"]["accuracy"].is_number());
}

#[tokio::test]
async fn test_train_source_failure_reports_stage() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .set_next_error(mlgate_core::source::SourceError::Configuration(
            "no connection url".into(),
        ))
        .await;

    let response = fixture.post("/api/v1/train", json!({})).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["stage"], "ingest");
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_runs_list_and_get() {
    let fixture = TestFixture::new().await;
    let train = fixture.post("/api/v1/train", json!({})).await;
    let run_id = train.body["run_id"].as_str().unwrap().to_string();

    let list = fixture.get("/api/v1/runs?limit=10").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["limit"], 10);
    let runs = list.body["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["run_id"], run_id.as_str());
    assert_eq!(runs[0]["outcome"], "promoted");

    let single = fixture.get(&format!("/api/v1/runs/{}", run_id)).await;
    assert_eq!(single.status, StatusCode::OK);
    assert_eq!(single.body["run_id"], run_id.as_str());
    assert!(single.body["challenger_accuracy"].is_number());
}

#[tokio::test]
async fn test_runs_limit_is_capped() {
    let fixture = TestFixture::new().await;
    let list = fixture.get("/api/v1/runs?limit=100000").await;

    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["limit"], 500);
    assert_eq!(list.body["runs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_unknown_run_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/runs/does-not-exist").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("does-not-exist"));
}

#[tokio::test]
async fn test_predict_without_champion() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/predict", record_without_target(4)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predict_after_promotion() {
    let fixture = TestFixture::new().await;
    let train = fixture.post("/api/v1/train", json!({})).await;
    assert_eq!(train.status, StatusCode::OK);

    let response = fixture.post("/api/v1/predict", record_without_target(4)).await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    let prediction = response.body["prediction"].as_i64().unwrap();
    assert!(prediction == 0 || prediction == 1);
    let probability = response.body["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
}

#[tokio::test]
async fn test_predict_rejects_non_object_body() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/predict", json!([1, 2, 3])).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_missing_feature_is_unprocessable() {
    let fixture = TestFixture::new().await;
    fixture.post("/api/v1/train", json!({})).await;

    let mut record = record_without_target(4);
    record.as_object_mut().unwrap().remove("Age");
    let response = fixture.post("/api/v1/predict", record).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap();
    assert!(text.contains("mlgate_http_requests_total"));
}
