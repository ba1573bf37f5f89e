use anyhow::Context;
use kling_video::{server, Generator, KlingClient, ServerConfig, VideoService};
use kling_video::{CredentialSource, EnvCredentials};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kling_video=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    if EnvCredentials.credentials().is_err() {
        tracing::warn!(
            "no Kling credentials configured yet; requests will fall back until they are set"
        );
    }

    let client = KlingClient::new_with_url(Arc::new(EnvCredentials), &config.api_url)
        .context("failed to build Kling client")?;
    let service = VideoService::new(Generator::new(client, config.poll))
        .with_fallback_url(config.fallback_video_url.clone())
        .with_sentinel_delay(config.sentinel_delay);

    let policy = service.generator().policy();
    let app = server::router(Arc::new(service));

    tracing::info!(
        api_url = %config.api_url,
        interval = ?policy.interval,
        max_attempts = policy.max_attempts,
        "starting server on {}",
        config.addr
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.addr))?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
