mod common;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use kling_video::{
    server, GenerationRequest, Generator, KlingError, PollPolicy, TaskCreated, TaskInfo,
    TaskKind, VideoProvider, VideoService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

/// Finishes every task on the first poll with a fixed url.
struct InstantProvider;

#[async_trait]
impl VideoProvider for InstantProvider {
    async fn create(&self, request: &GenerationRequest) -> Result<TaskCreated, KlingError> {
        Ok(serde_json::from_value(json!({ "task_id": format!("stub-{}", request.kind()) }))?)
    }

    async fn fetch(&self, _kind: TaskKind, task_id: &str) -> Result<TaskInfo, KlingError> {
        if task_id == "missing" {
            return Err(KlingError::ApiError {
                message: "task not found".to_string(),
            });
        }
        Ok(serde_json::from_value(json!({
            "task_id": task_id,
            "task_status": "succeed",
            "task_result": {
                "videos": [{ "id": "v", "url": "https://cdn/out.mp4", "duration": "5" }]
            }
        }))?)
    }
}

fn app() -> axum::Router {
    let policy = PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 3,
    };
    let service = VideoService::new(Generator::new(InstantProvider, policy))
        .with_sentinel_delay(Duration::from_millis(1));
    server::router(Arc::new(service))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate-video")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_generate_returns_caller_shape() {
    let (status, body) = send(post_json(
        r#"{ "input": "A cat on a skateboard", "model": "kling-v1", "duration": 5 }"#,
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["videoUrl"], "https://cdn/out.mp4");
    assert_eq!(body["thumbnailUrl"], "https://cdn/out.mp4");
    assert_eq!(body["duration"], 5);
    assert_eq!(body["aspect_ratio"], "16:9");
    assert_eq!(body["metadata"]["task_id"], "stub-text2video");
    assert_eq!(body["metadata"]["settings"]["mode"], "std");
    assert!(body["metadata"]["timestamp"].is_string());
    assert!(body["metadata"].get("isTestMode").is_none());
}

#[tokio::test]
async fn test_sentinel_over_http() {
    let (status, body) = send(post_json(r#"{ "input": "测试" }"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videoUrl"], "/测试.mp4");
    assert_eq!(body["metadata"]["isTestMode"], true);
    assert_eq!(body["metadata"]["testType"], "user_requested");
}

#[tokio::test]
async fn test_validation_failure_is_400_with_error() {
    let (status, body) = send(post_json(r#"{ "input": "" }"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("input"));
}

#[tokio::test]
async fn test_malformed_json_is_400_with_error() {
    let (status, body) = send(post_json("{ not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_task_status_lookup() {
    let request = Request::builder()
        .uri("/api/video-task/image2video/abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], "abc");
    assert_eq!(body["status"], "succeed");
    assert_eq!(body["videoUrl"], "https://cdn/out.mp4");

    let request = Request::builder()
        .uri("/api/video-task/text2video/missing")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("task not found"));

    let request = Request::builder()
        .uri("/api/video-task/audio/abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_encoded_traversal_in_task_id_is_rejected() {
    let provider = MockServer::start().await;
    let app = server::router(Arc::new(common::service_for(&provider)));

    let request = Request::builder()
        .uri("/api/video-task/text2video/..%2F..%2F..%2Fv1%2Faccount%2Fsecrets")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid task id"));
    assert!(provider.received_requests().await.unwrap().is_empty());
}
