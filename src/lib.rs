//! A client and proxy service for the Kling video generation API.
//!
//! Generation on Kling is asynchronous: a task is created on one of three
//! endpoints and then polled until it finishes. This crate wraps that lifecycle
//! and puts an HTTP service in front of it that never surfaces provider outages
//! to callers. When the provider path fails, a fixed fallback video is returned
//! and marked as degraded instead.
//!
//! ## Features
//! - Text-to-video, image-to-video and multi-image-to-video task creation.
//! - Bounded task polling with a configurable interval and attempt budget.
//! - Credentials resolved at request time (API key or signed access/secret key pair).
//! - Typed request validation; malformed input is the only caller-visible error.
//! - An axum router exposing the generation endpoint.
//!
//! ```no_run
//! # use kling_video::{Generator, GenerateVideoBody, KlingClient, PollPolicy, VideoService};
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let client = KlingClient::new(None)?;
//! let service = VideoService::new(Generator::new(client, PollPolicy::default()));
//! let body = GenerateVideoBody {
//!     input: "A cat on a skateboard".to_string(),
//!     ..Default::default()
//! };
//! let response = service.generate(body).await?;
//! println!("{} (degraded: {})", response.video_url, response.is_degraded());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod request;
pub mod server;
pub mod service;
pub mod types;

pub use client::KlingClient;
pub use config::{CredentialSource, Credentials, EnvCredentials, ServerConfig};
pub use error::{GenerationError, KlingError, ValidationError};
pub use poller::{CompletedVideo, Generator, Job, JobStatus, PollPolicy, VideoProvider};
pub use request::{
    AspectRatio, GenerateVideoBody, GenerationRequest, Mode, ReferenceImage, VideoParams,
};
pub use service::{VideoResponse, VideoService};
pub use types::*;
