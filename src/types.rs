use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three provider endpoints a generation task can belong to.
///
/// Kling scopes task lookups by the endpoint the task was created on, so the
/// kind travels alongside the task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "text2video")]
    Text2Video,
    #[serde(rename = "image2video")]
    Image2Video,
    #[serde(rename = "multi-image2video")]
    MultiImage2Video,
}

impl TaskKind {
    /// The path segment used by the provider for this kind.
    pub fn as_path(&self) -> &'static str {
        match self {
            TaskKind::Text2Video => "text2video",
            TaskKind::Image2Video => "image2video",
            TaskKind::MultiImage2Video => "multi-image2video",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text2video" => Ok(TaskKind::Text2Video),
            "image2video" => Ok(TaskKind::Image2Video),
            "multi-image2video" => Ok(TaskKind::MultiImage2Video),
            other => Err(format!("unknown task kind `{other}`")),
        }
    }
}

/// Longest task id accepted for status lookups.
pub const MAX_TASK_ID_LEN: usize = 128;

/// Whether `id` can be used as a single path segment in a status lookup.
pub fn is_valid_task_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_TASK_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// (Internal) Request body for `v1/videos/text2video`.
#[derive(Serialize, Debug)]
pub(crate) struct TextToVideoBody<'a> {
    pub(crate) model_name: &'a str,
    pub(crate) prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cfg_scale: Option<f32>,
    pub(crate) mode: &'a str,
    pub(crate) aspect_ratio: &'a str,
    pub(crate) duration: String,
}

/// (Internal) Request body for `v1/videos/image2video`.
#[derive(Serialize, Debug)]
pub(crate) struct ImageToVideoBody<'a> {
    pub(crate) model_name: &'a str,
    pub(crate) image: &'a str,
    pub(crate) prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cfg_scale: Option<f32>,
    pub(crate) mode: &'a str,
    pub(crate) duration: String,
}

/// One entry of the `image_list` array, shared by the caller-facing body and
/// the provider request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageListItem {
    pub image: String,
}

/// (Internal) Request body for `v1/videos/multi-image2video`.
#[derive(Serialize, Debug)]
pub(crate) struct MultiImageToVideoBody<'a> {
    pub(crate) model_name: &'a str,
    pub(crate) image_list: Vec<ImageListItem>,
    pub(crate) prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) negative_prompt: Option<&'a str>,
    pub(crate) mode: &'a str,
    pub(crate) aspect_ratio: &'a str,
    pub(crate) duration: String,
}

/// The response from a call that successfully creates a task.
#[derive(Deserialize, Debug)]
pub struct TaskCreated {
    pub task_id: String,
    #[serde(default)]
    pub task_status: Option<TaskState>,
}

/// Provider-side lifecycle of a task.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Processing,
    #[serde(rename = "succeed")]
    Succeeded,
    Failed,
}

/// A generated video file.
#[derive(Debug, Deserialize, Clone)]
pub struct VideoAsset {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds, reported by the provider as a string such as `"5.1"`.
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskResult {
    #[serde(default)]
    pub videos: Vec<VideoAsset>,
}

/// The status and output of a task, as returned by the status endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct TaskInfo {
    pub task_id: String,
    pub task_status: TaskState,
    /// Failure reason, set when `task_status` is `failed`.
    #[serde(default)]
    pub task_status_msg: Option<String>,
    #[serde(default)]
    pub task_result: Option<TaskResult>,
}

impl TaskInfo {
    /// The first non-empty video url in the result list, if any.
    pub fn first_video_url(&self) -> Option<&str> {
        self.task_result
            .as_ref()?
            .videos
            .iter()
            .filter_map(|v| v.url.as_deref())
            .find(|url| !url.is_empty())
    }
}

/// (Internal) The provider envelope. `code` is zero on success.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) request_id: Option<String>,
    pub(crate) data: Option<T>,
}
