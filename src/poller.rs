//! Task submission and status polling.

use crate::client::KlingClient;
use crate::error::{GenerationError, KlingError};
use crate::request::GenerationRequest;
use crate::types::{TaskCreated, TaskInfo, TaskKind, TaskState};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// A backend able to create video tasks and report on them.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Creates a task on the endpoint matching the request variant.
    async fn create(&self, request: &GenerationRequest) -> Result<TaskCreated, KlingError>;

    async fn fetch(&self, kind: TaskKind, task_id: &str) -> Result<TaskInfo, KlingError>;
}

#[async_trait]
impl VideoProvider for KlingClient {
    async fn create(&self, request: &GenerationRequest) -> Result<TaskCreated, KlingError> {
        match request {
            GenerationRequest::TextToVideo {
                params,
                aspect_ratio,
            } => self.text_to_video(params, *aspect_ratio).await,
            GenerationRequest::ImageToVideo { params, image } => {
                self.image_to_video(params, image).await
            }
            GenerationRequest::MultiImageToVideo {
                params,
                aspect_ratio,
                images,
            } => self.multi_image_to_video(params, *aspect_ratio, images).await,
        }
    }

    async fn fetch(&self, kind: TaskKind, task_id: &str) -> Result<TaskInfo, KlingError> {
        self.get_task(kind, task_id).await
    }
}

/// Where a job stands, as last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Processing,
    Succeeded { video_url: String },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. } | JobStatus::Failed { .. })
    }
}

/// A task issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub task_id: String,
    pub kind: TaskKind,
    pub status: JobStatus,
}

/// A finished video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedVideo {
    pub task_id: String,
    pub video_url: String,
}

/// How often and how many times to check a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Submits generation requests and waits for their tasks to finish.
pub struct Generator<P> {
    provider: P,
    policy: PollPolicy,
}

impl<P: VideoProvider> Generator<P> {
    pub fn new(provider: P, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Creates the provider task for `request`.
    ///
    /// The request was validated when it was built, so the only failure here is
    /// [`GenerationError::Provider`].
    pub async fn submit(&self, request: &GenerationRequest) -> Result<Job, GenerationError> {
        let kind = request.kind();
        let created = self.provider.create(request).await?;
        tracing::info!(task_id = %created.task_id, %kind, "generation task submitted");

        Ok(Job {
            task_id: created.task_id,
            kind,
            status: JobStatus::Submitted,
        })
    }

    /// Polls `job` until it succeeds, fails, or the attempt budget is spent.
    ///
    /// Each attempt sleeps for the policy interval first, then fetches the
    /// status once. Attempts never overlap. A failed status fetch ends the wait
    /// with [`GenerationError::Provider`].
    pub async fn await_completion(&self, job: &mut Job) -> Result<CompletedVideo, GenerationError> {
        for attempt in 1..=self.policy.max_attempts {
            sleep(self.policy.interval).await;

            let info = self.provider.fetch(job.kind, &job.task_id).await?;
            tracing::debug!(
                task_id = %job.task_id,
                attempt,
                status = ?info.task_status,
                "polled task status"
            );

            match info.task_status {
                TaskState::Succeeded => {
                    let Some(url) = info.first_video_url() else {
                        return Err(GenerationError::MissingAsset {
                            task_id: job.task_id.clone(),
                        });
                    };
                    job.status = JobStatus::Succeeded {
                        video_url: url.to_string(),
                    };
                    return Ok(CompletedVideo {
                        task_id: job.task_id.clone(),
                        video_url: url.to_string(),
                    });
                }
                TaskState::Failed => {
                    let message = info
                        .task_status_msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "task failed without a reason".to_string());
                    job.status = JobStatus::Failed {
                        message: message.clone(),
                    };
                    return Err(GenerationError::Provider(message));
                }
                TaskState::Processing => job.status = JobStatus::Processing,
                TaskState::Submitted => {}
            }
        }

        Err(GenerationError::Timeout {
            task_id: job.task_id.clone(),
            attempts: self.policy.max_attempts,
        })
    }
}
