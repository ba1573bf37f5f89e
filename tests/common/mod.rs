#![allow(dead_code)]

use kling_video::{Credentials, Generator, KlingClient, PollPolicy, VideoService};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const API_KEY: &str = "test_api_key";

pub fn client_for(server: &MockServer) -> KlingClient {
    KlingClient::new_with_url(
        Arc::new(Credentials::ApiKey(API_KEY.to_string())),
        &server.uri(),
    )
    .unwrap()
}

pub fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

pub fn service_for(server: &MockServer) -> VideoService<KlingClient> {
    VideoService::new(Generator::new(client_for(server), fast_policy(30)))
        .with_sentinel_delay(Duration::from_millis(10))
}

/// The envelope returned when a task is created.
pub fn created(task_id: &str) -> Value {
    json!({
        "code": 0,
        "message": "SUCCEED",
        "request_id": "req-1",
        "data": {
            "task_id": task_id,
            "task_status": "submitted",
            "created_at": 1722769557708u64,
            "updated_at": 1722769557708u64
        }
    })
}

pub fn status(task_id: &str, state: &str) -> Value {
    json!({
        "code": 0,
        "message": "SUCCEED",
        "request_id": "req-2",
        "data": {
            "task_id": task_id,
            "task_status": state,
            "created_at": 1722769557708u64,
            "updated_at": 1722769557708u64
        }
    })
}

pub fn succeeded(task_id: &str, url: &str) -> Value {
    let mut body = status(task_id, "succeed");
    body["data"]["task_result"] = json!({
        "videos": [{ "id": "video-1", "url": url, "duration": "5.1" }]
    });
    body
}

pub fn failed(task_id: &str, reason: &str) -> Value {
    let mut body = status(task_id, "failed");
    body["data"]["task_status_msg"] = json!(reason);
    body
}

/// Answers with each body in turn, repeating the last one once exhausted.
pub struct StatusSequence {
    bodies: Vec<Value>,
    served: AtomicUsize,
}

impl StatusSequence {
    pub fn new(bodies: Vec<Value>) -> Self {
        Self {
            bodies,
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for StatusSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.served.fetch_add(1, Ordering::SeqCst);
        let body = &self.bodies[count.min(self.bodies.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body.clone())
    }
}
