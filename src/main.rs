//! Replay receiver entry point.

use replay_consumer::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ReplayConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        bind_address = %config.bind_addr(),
        dispatch_timeout_secs = config.dispatch_timeout_secs,
        max_body_size = config.max_body_size,
        "Starting replay receiver"
    );

    ReplayServer::new(config).run().await
}
