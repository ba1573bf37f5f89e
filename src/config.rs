use crate::error::KlingError;
use crate::poller::PollPolicy;
use anyhow::Context;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.klingai.com/";

/// Local asset served when the provider path fails or the sentinel prompt is used.
pub const DEFAULT_FALLBACK_VIDEO_URL: &str = "/测试.mp4";

/// Credentials accepted by the Kling API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A ready-made bearer token, as issued by some Kling gateways.
    ApiKey(String),
    /// An access/secret key pair, exchanged for a short-lived HS256 token per request.
    AccessKey {
        access_key: String,
        secret_key: String,
    },
}

/// Something that can hand out the current credentials.
///
/// [`KlingClient`](crate::KlingClient) asks its source on every request, so a
/// source backed by mutable configuration picks up changes without a restart.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Credentials, KlingError>;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Result<Credentials, KlingError> {
        Ok(self.clone())
    }
}

/// Reads `KLING_API_KEY`, or `KLING_ACCESS_KEY` and `KLING_SECRET_KEY`, at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Result<Credentials, KlingError> {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        if let (Some(access_key), Some(secret_key)) =
            (non_empty("KLING_ACCESS_KEY"), non_empty("KLING_SECRET_KEY"))
        {
            return Ok(Credentials::AccessKey {
                access_key,
                secret_key,
            });
        }
        non_empty("KLING_API_KEY")
            .map(Credentials::ApiKey)
            .ok_or(KlingError::MissingCredentials)
    }
}

/// Settings for the HTTP service, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub api_url: String,
    pub fallback_video_url: String,
    pub poll: PollPolicy,
    pub sentinel_delay: Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host: IpAddr = parse_var("HOST", "0.0.0.0")?;
        let port: u16 = parse_var("PORT", "3000")?;
        let interval_secs: u64 = parse_var("POLL_INTERVAL_SECS", "10")?;
        let max_attempts: u32 = parse_var("POLL_MAX_ATTEMPTS", "30")?;
        let sentinel_secs: u64 = parse_var("SENTINEL_DELAY_SECS", "5")?;

        Ok(Self {
            addr: SocketAddr::new(host, port),
            api_url: env::var("KLING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            fallback_video_url: env::var("FALLBACK_VIDEO_URL")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_VIDEO_URL.to_string()),
            poll: PollPolicy {
                interval: Duration::from_secs(interval_secs),
                max_attempts,
            },
            sentinel_delay: Duration::from_secs(sentinel_secs),
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().with_context(|| format!("{key} has an invalid value `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test touching these variables; keep it that way.
    #[test]
    fn env_credentials_follow_the_environment() {
        env::remove_var("KLING_ACCESS_KEY");
        env::remove_var("KLING_SECRET_KEY");
        env::remove_var("KLING_API_KEY");
        assert!(matches!(
            EnvCredentials.credentials(),
            Err(KlingError::MissingCredentials)
        ));

        env::set_var("KLING_API_KEY", "key-one");
        assert_eq!(
            EnvCredentials.credentials().unwrap(),
            Credentials::ApiKey("key-one".to_string())
        );

        env::set_var("KLING_API_KEY", "key-two");
        assert_eq!(
            EnvCredentials.credentials().unwrap(),
            Credentials::ApiKey("key-two".to_string())
        );

        env::set_var("KLING_ACCESS_KEY", "ak");
        env::set_var("KLING_SECRET_KEY", "sk");
        assert_eq!(
            EnvCredentials.credentials().unwrap(),
            Credentials::AccessKey {
                access_key: "ak".to_string(),
                secret_key: "sk".to_string(),
            }
        );

        env::remove_var("KLING_ACCESS_KEY");
        env::remove_var("KLING_SECRET_KEY");
        env::remove_var("KLING_API_KEY");
    }
}
