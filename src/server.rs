use crate::error::{KlingError, ValidationError};
use crate::poller::VideoProvider;
use crate::request::GenerateVideoBody;
use crate::service::{VideoResponse, VideoService};
use crate::types::{is_valid_task_id, TaskKind, TaskState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Upstream(String),
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::BadRequest(value.0)
    }
}

impl From<KlingError> for AppError {
    fn from(value: KlingError) -> Self {
        Self::Upstream(value.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct TaskStatusResponse {
    task_id: String,
    status: TaskState,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Builds the HTTP surface around `service`.
pub fn router<P: VideoProvider + 'static>(service: Arc<VideoService<P>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-video", post(generate_video::<P>))
        .route("/api/video-task/{kind}/{task_id}", get(task_status::<P>))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_video<P: VideoProvider + 'static>(
    State(service): State<Arc<VideoService<P>>>,
    body: Result<Json<GenerateVideoBody>, JsonRejection>,
) -> AppResult<Json<VideoResponse>> {
    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let response = service.generate(body).await?;
    Ok(Json(response))
}

async fn task_status<P: VideoProvider + 'static>(
    State(service): State<Arc<VideoService<P>>>,
    Path((kind, task_id)): Path<(String, String)>,
) -> AppResult<Json<TaskStatusResponse>> {
    let kind: TaskKind = kind.parse().map_err(AppError::BadRequest)?;
    if !is_valid_task_id(&task_id) {
        return Err(AppError::BadRequest(format!("invalid task id `{task_id}`")));
    }
    let info = service.generator().provider().fetch(kind, &task_id).await?;

    Ok(Json(TaskStatusResponse {
        video_url: info.first_video_url().map(str::to_string),
        message: info.task_status_msg.filter(|m| !m.is_empty()),
        status: info.task_status,
        task_id: info.task_id,
    }))
}
