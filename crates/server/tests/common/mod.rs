//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! over a real pipeline whose source and registry store are in-memory mocks.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mlgate_core::{
    testing::{MemoryObjectStore, MockSource},
    Config, SqliteRunStore, TrainingPipeline,
};
use mlgate_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mlgate_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_train() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.post("/api/v1/train", json!({})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for driving concurrent requests
    pub state: Arc<AppState>,
    /// Mock source - configure documents and failures
    pub source: Arc<MockSource>,
    /// In-memory registry store
    pub store: Arc<MemoryObjectStore>,
    /// Temporary directory for artifacts and logs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture whose source serves 200 synthetic insurance documents.
    pub async fn new() -> Self {
        Self::with_documents(fixtures::insurance_documents(200, 11)).await
    }

    pub async fn with_documents(documents: Vec<Value>) -> Self {
        Self::with_config(documents, |_| {}).await
    }

    /// Fixture with config tweaks applied on top of the test defaults.
    pub async fn with_config(documents: Vec<Value>, tweak: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let logs = temp_dir.path().join("logs");
        std::fs::create_dir_all(&logs).expect("Failed to create logs dir");
        std::fs::write(logs.join("server.log"), "INFO serving\n").expect("Failed to write log");

        let source = Arc::new(MockSource::new());
        source.set_documents(documents).await;
        let store = Arc::new(MemoryObjectStore::new());
        let run_store = Arc::new(SqliteRunStore::in_memory().expect("Failed to open run store"));

        let mut config = Config::default();
        config.pipeline.artifact_dir = temp_dir.path().join("artifact");
        config.pipeline.logs_dir = temp_dir.path().join("logs");
        config.pipeline.run_timestamp = Some("15_10_2026_12_00_00".to_string());
        config.source.retry.delay_ms = 1;
        config.trainer.n_estimators = 15;
        tweak(&mut config);

        let pipeline = TrainingPipeline::new(
            config,
            fixtures::insurance_schema(),
            source.clone(),
            store.clone(),
        )
        .with_run_store(run_store.clone());
        let state = Arc::new(AppState::new(pipeline, run_store));
        let router = mlgate_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            source,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}
