//! Turns caller requests into caller-facing responses.
//!
//! Provider-side failures never reach the caller as errors: they are replaced
//! by a fallback video marked as a degraded result. Only [`ValidationError`]
//! is returned as an error.

use crate::config::DEFAULT_FALLBACK_VIDEO_URL;
use crate::error::{GenerationError, ValidationError};
use crate::poller::{CompletedVideo, Generator, VideoProvider};
use crate::request::{
    AspectRatio, GenerateVideoBody, GenerationRequest, DEFAULT_DURATION, DEFAULT_MODEL,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

/// Prompt that skips the provider and returns the fallback video.
pub const SENTINEL_PROMPT: &str = "测试";
/// `testType` reported for the sentinel prompt.
pub const USER_REQUESTED_TEST: &str = "user_requested";
/// Longest prefix of the prompt echoed back in metadata, in characters.
pub const METADATA_INPUT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: String,
    pub aspect_ratio: String,
    pub duration: u32,
    pub reference_images: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub model: String,
    pub input: String,
    pub timestamp: DateTime<Utc>,
    pub task_id: String,
    pub settings: Settings,
    #[serde(rename = "isTestMode", skip_serializing_if = "Option::is_none")]
    pub is_test_mode: Option<bool>,
    /// Set when the fallback was explicitly asked for.
    #[serde(rename = "testType", skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    /// Set when the fallback replaced a failed generation; holds the failure text.
    #[serde(rename = "apiStatus", skip_serializing_if = "Option::is_none")]
    pub api_status: Option<String>,
}

/// Body of a successful `POST /api/generate-video`, real or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResponse {
    pub success: bool,
    pub result: String,
    #[serde(rename = "videoUrl")]
    pub video_url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    pub duration: u32,
    pub aspect_ratio: String,
    pub metadata: ResponseMetadata,
}

impl VideoResponse {
    pub fn is_degraded(&self) -> bool {
        self.metadata.is_test_mode == Some(true)
    }
}

pub struct VideoService<P> {
    generator: Generator<P>,
    fallback_video_url: String,
    sentinel_delay: Duration,
}

impl<P: VideoProvider> VideoService<P> {
    pub fn new(generator: Generator<P>) -> Self {
        Self {
            generator,
            fallback_video_url: DEFAULT_FALLBACK_VIDEO_URL.to_string(),
            sentinel_delay: Duration::from_secs(5),
        }
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_video_url = url.into();
        self
    }

    pub fn with_sentinel_delay(mut self, delay: Duration) -> Self {
        self.sentinel_delay = delay;
        self
    }

    pub fn generator(&self) -> &Generator<P> {
        &self.generator
    }

    /// Runs one generation end to end.
    ///
    /// # Errors
    ///
    /// Only for malformed input. Provider failures, missing assets and
    /// timeouts come back as `Ok` with a degraded response.
    pub async fn generate(
        &self,
        body: GenerateVideoBody,
    ) -> Result<VideoResponse, ValidationError> {
        if body.input == SENTINEL_PROMPT {
            return Ok(self.sentinel_response(&body).await);
        }

        let request = GenerationRequest::try_from(body)?;
        let mut task_id = None;

        match self.run(&request, &mut task_id).await {
            Ok(video) => {
                tracing::info!(task_id = %video.task_id, url = %video.video_url, "video generated");
                Ok(self.success_response(&request, video))
            }
            Err(GenerationError::Validation(err)) => Err(err),
            Err(err) => {
                tracing::warn!(
                    task_id = task_id.as_deref().unwrap_or("-"),
                    error = %err,
                    "generation failed, returning fallback video"
                );
                Ok(self.degraded_response(&request, task_id, &err))
            }
        }
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        task_id: &mut Option<String>,
    ) -> Result<CompletedVideo, GenerationError> {
        let mut job = self.generator.submit(request).await?;
        *task_id = Some(job.task_id.clone());
        self.generator.await_completion(&mut job).await
    }

    async fn sentinel_response(&self, body: &GenerateVideoBody) -> VideoResponse {
        tracing::info!("sentinel prompt received, skipping provider");
        sleep(self.sentinel_delay).await;

        let now = Utc::now();
        let duration = body
            .duration
            .and_then(|d| u32::try_from(d).ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DURATION);
        let aspect_ratio = body
            .aspect_ratio
            .clone()
            .unwrap_or_else(|| AspectRatio::default().to_string());

        VideoResponse {
            success: true,
            result: "Test video returned".to_string(),
            video_url: self.fallback_video_url.clone(),
            thumbnail_url: self.fallback_video_url.clone(),
            duration,
            aspect_ratio: aspect_ratio.clone(),
            metadata: ResponseMetadata {
                model: body.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                input: truncate_chars(&body.input, METADATA_INPUT_CHARS),
                timestamp: now,
                task_id: format!("test_{}", now.timestamp_millis()),
                settings: Settings {
                    mode: body.mode.clone().unwrap_or_else(|| "std".to_string()),
                    aspect_ratio,
                    duration,
                    reference_images: body.images.len() + body.image_list.len(),
                    negative_prompt: body.negative_prompt.clone(),
                },
                is_test_mode: Some(true),
                test_type: Some(USER_REQUESTED_TEST.to_string()),
                api_status: None,
            },
        }
    }

    fn success_response(
        &self,
        request: &GenerationRequest,
        video: CompletedVideo,
    ) -> VideoResponse {
        let metadata = metadata_for(request, video.task_id);

        VideoResponse {
            success: true,
            result: "Video generated successfully".to_string(),
            thumbnail_url: video.video_url.clone(),
            video_url: video.video_url,
            duration: request.params().duration,
            aspect_ratio: metadata.settings.aspect_ratio.clone(),
            metadata,
        }
    }

    fn degraded_response(
        &self,
        request: &GenerationRequest,
        task_id: Option<String>,
        err: &GenerationError,
    ) -> VideoResponse {
        let task_id =
            task_id.unwrap_or_else(|| format!("fallback_{}", Utc::now().timestamp_millis()));
        let mut metadata = metadata_for(request, task_id);
        metadata.is_test_mode = Some(true);
        metadata.api_status = Some(err.to_string());

        VideoResponse {
            success: true,
            result: "Video service unavailable, returned fallback video".to_string(),
            video_url: self.fallback_video_url.clone(),
            thumbnail_url: self.fallback_video_url.clone(),
            duration: request.params().duration,
            aspect_ratio: metadata.settings.aspect_ratio.clone(),
            metadata,
        }
    }
}

fn metadata_for(request: &GenerationRequest, task_id: String) -> ResponseMetadata {
    let params = request.params();
    ResponseMetadata {
        model: params.model.clone(),
        input: truncate_chars(&params.prompt, METADATA_INPUT_CHARS),
        timestamp: Utc::now(),
        task_id,
        settings: Settings {
            mode: params.mode.to_string(),
            aspect_ratio: request.aspect_ratio().unwrap_or_default().to_string(),
            duration: params.duration,
            reference_images: request.reference_count(),
            negative_prompt: params.negative_prompt.clone(),
        },
        is_test_mode: None,
        test_type: None,
        api_status: None,
    }
}

/// Keeps the first `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
