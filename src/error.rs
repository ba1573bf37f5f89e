/// Errors raised by [`KlingClient`](crate::KlingClient) while talking to the provider.
#[derive(Debug, thiserror::Error)]
pub enum KlingError {
    #[error("no Kling credentials: set KLING_API_KEY or KLING_ACCESS_KEY/KLING_SECRET_KEY")]
    MissingCredentials,
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Failed to parse API response: {0}")]
    ResponseParseFailed(#[from] serde_json::Error),
    #[error("API request failed: {message}")]
    ApiError { message: String },
    #[error("invalid task id `{0}`")]
    InvalidTaskId(String),
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("Token signing failed: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),
}

/// Malformed caller input. Never degraded into a fallback result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Everything that can go wrong while producing a video.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Submission was rejected, or the task reported failure.
    #[error("provider error: {0}")]
    Provider(String),
    #[error("task {task_id} succeeded without a video url")]
    MissingAsset { task_id: String },
    #[error("task {task_id} did not finish after {attempts} status checks")]
    Timeout { task_id: String, attempts: u32 },
}

impl From<KlingError> for GenerationError {
    fn from(err: KlingError) -> Self {
        match err {
            KlingError::ApiError { message } => GenerationError::Provider(message),
            other => GenerationError::Provider(other.to_string()),
        }
    }
}
