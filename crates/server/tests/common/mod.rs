//! Common test utilities for API testing with mock stages.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock stage collaborators injected, so the HTTP surface can be
//! exercised without OpenRouter, OpenVoice, Unsplash, ffmpeg or Slack.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use phrasereel_core::{
    testing::{fixtures, MockStages},
    Config, ProgressStore, VideoGenerator,
};
use phrasereel_server::state::AppState;

/// Test fixture for API testing with mock stages.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_job_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/jobs", json!({ "id": "job-1" })).await;
///
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock stage collaborators
    pub mocks: MockStages,
    /// Generator shared with the router
    pub generator: VideoGenerator,
    /// Progress store shared with the router
    pub progress: ProgressStore,
    /// Temporary directory for output and temp files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with capacity 3.
    pub fn new() -> Self {
        Self::with_capacity(3)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.server.port = 0; // Not used for in-process testing
        config.generator =
            fixtures::generator_config(temp_dir.path()).with_max_concurrent_jobs(capacity);
        config.content.api_key = "test-openrouter-key".to_string();

        let mocks = MockStages::new();
        let generator = VideoGenerator::new(config.generator.clone(), mocks.stage_set())
            .expect("Failed to create generator");
        let progress = ProgressStore::new(Duration::from_secs(60));

        let state = Arc::new(AppState::new(config, generator.clone(), progress.clone()));
        let router = phrasereel_server::api::create_router(state);

        Self {
            router,
            mocks,
            generator,
            progress,
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

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Poll a job until its progress reaches a terminal status.
    pub async fn wait_for_terminal(&self, id: &str) -> Value {
        for _ in 0..500 {
            let response = self.get(&format!("/api/v1/jobs/{}", id)).await;
            if let Some(status) = response.body["status"].as_str() {
                if matches!(status, "completed" | "failed" | "cancelled") {
                    return response.body;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} did not reach a terminal status", id);
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

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
