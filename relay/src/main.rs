//! Relay worker - topic consumer delivering replies to Messenger.
//!
//! This worker consumes delivery envelopes from the relay topic and
//! forwards each reply to the originating chat via the Graph send API.

mod consumer;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("worker_starting");

    // Load configuration from environment
    let config = Config::from_env();
    tracing::info!(
        topic = %config.topic,
        page_id_configured = config.page_id.is_some(),
        page_access_token_configured = config.page_access_token.is_some(),
        concurrency = config.worker_concurrency,
        "config_loaded"
    );

    // Start the consumer
    consumer::run(config).await?;

    Ok(())
}
