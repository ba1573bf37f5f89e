use crate::auth::bearer_token;
use crate::config::{CredentialSource, Credentials, EnvCredentials, DEFAULT_API_URL};
use crate::error::KlingError;
use crate::request::{AspectRatio, ReferenceImage, VideoParams};
use crate::types::{
    is_valid_task_id, ApiResponse, ImageListItem, ImageToVideoBody, MultiImageToVideoBody,
    TaskCreated, TaskInfo, TaskKind, TextToVideoBody,
};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// The client for the Kling video API.
///
/// It holds the shared `reqwest::Client`, the base URL and a credential source.
/// Credentials are resolved on every request. It is cheap to clone and safe to
/// share across tasks.
#[derive(Clone)]
pub struct KlingClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl KlingClient {
    /// Creates a new `KlingClient` against the public API.
    ///
    /// With `None`, credentials are read from the environment on each request
    /// (see [`EnvCredentials`]).
    ///
    /// # Errors
    ///
    /// - `KlingError::RequestFailed` if the internal HTTP client fails to build.
    pub fn new(credentials: Option<Credentials>) -> Result<Self, KlingError> {
        let source: Arc<dyn CredentialSource> = match credentials {
            Some(creds) => Arc::new(creds),
            None => Arc::new(EnvCredentials),
        };
        Self::new_with_url(source, DEFAULT_API_URL)
    }

    /// Creates a new `KlingClient` with a custom base URL and credential source.
    ///
    /// This is useful for testing or for going through a gateway.
    ///
    /// # Errors
    ///
    /// - `KlingError::RequestFailed` if the internal HTTP client fails to build.
    /// - `KlingError::UrlParseFailed` if the provided `base_url` is invalid.
    pub fn new_with_url(
        credentials: Arc<dyn CredentialSource>,
        base_url: &str,
    ) -> Result<Self, KlingError> {
        let client = reqwest::Client::builder().build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Submits a text-to-video task.
    ///
    /// # Returns
    ///
    /// A [`TaskCreated`] containing the ID of the new task.
    pub async fn text_to_video(
        &self,
        params: &VideoParams,
        aspect_ratio: AspectRatio,
    ) -> Result<TaskCreated, KlingError> {
        let body = TextToVideoBody {
            model_name: &params.model,
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            cfg_scale: params.cfg_scale,
            mode: params.mode.as_str(),
            aspect_ratio: aspect_ratio.as_str(),
            duration: params.duration.to_string(),
        };
        self.create_task(TaskKind::Text2Video, &body).await
    }

    /// Submits an image-to-video task driven by a single reference image.
    pub async fn image_to_video(
        &self,
        params: &VideoParams,
        image: &ReferenceImage,
    ) -> Result<TaskCreated, KlingError> {
        let body = ImageToVideoBody {
            model_name: &params.model,
            image: image.as_str(),
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            cfg_scale: params.cfg_scale,
            mode: params.mode.as_str(),
            duration: params.duration.to_string(),
        };
        self.create_task(TaskKind::Image2Video, &body).await
    }

    /// Submits a task with several reference images.
    ///
    /// Only `kling-v1-6` accepts this endpoint; the caller is expected to have
    /// checked the model already.
    pub async fn multi_image_to_video(
        &self,
        params: &VideoParams,
        aspect_ratio: AspectRatio,
        images: &[ReferenceImage],
    ) -> Result<TaskCreated, KlingError> {
        let body = MultiImageToVideoBody {
            model_name: &params.model,
            image_list: images
                .iter()
                .map(|img| ImageListItem {
                    image: img.as_str().to_string(),
                })
                .collect(),
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            mode: params.mode.as_str(),
            aspect_ratio: aspect_ratio.as_str(),
            duration: params.duration.to_string(),
        };
        self.create_task(TaskKind::MultiImage2Video, &body).await
    }

    /// Retrieves the status of a task.
    ///
    /// This is the primary method for polling a long-running generation task.
    /// Ids outside `[A-Za-z0-9_-]` are refused before any request is sent.
    pub async fn get_task(&self, kind: TaskKind, task_id: &str) -> Result<TaskInfo, KlingError> {
        if !is_valid_task_id(task_id) {
            return Err(KlingError::InvalidTaskId(task_id.to_string()));
        }
        let url = self.endpoint(&["v1", "videos", kind.as_path(), task_id])?;
        let request = self.authorized(self.client.get(url))?;
        Self::read_envelope(request).await
    }

    async fn create_task<B: serde::Serialize>(
        &self,
        kind: TaskKind,
        body: &B,
    ) -> Result<TaskCreated, KlingError> {
        let url = self.endpoint(&["v1", "videos", kind.as_path()])?;
        let request = self.authorized(self.client.post(url).json(body))?;
        let created: TaskCreated = Self::read_envelope(request).await?;
        tracing::debug!(task_id = %created.task_id, %kind, "task created");
        Ok(created)
    }

    /// Appends `segments` to the base URL, percent-encoding each one as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, KlingError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, KlingError> {
        let credentials = self.credentials.credentials()?;
        Ok(request.bearer_auth(bearer_token(&credentials)?))
    }

    async fn read_envelope<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, KlingError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_response: serde_json::Value = response.json().await.unwrap_or_default();
            let message = error_response
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}: {error_response}"));
            return Err(KlingError::ApiError { message });
        }

        let bytes = response.bytes().await?;
        let api_response: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        if api_response.code != 0 {
            return Err(KlingError::ApiError {
                message: format!(
                    "code {}: {} (request {})",
                    api_response.code,
                    api_response.message,
                    api_response.request_id.as_deref().unwrap_or("-")
                ),
            });
        }
        api_response.data.ok_or_else(|| KlingError::ApiError {
            message: "response carried no data".to_string(),
        })
    }
}
