//! partyd - party presence message broker daemon.

use partyd::config::Config;
use partyd::messaging::MessageProcessor;
use partyd::network::Gateway;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        listen = %config.listen.address,
        keepalive_secs = config.keepalive.timeout_secs,
        "Starting partyd"
    );

    let processor = MessageProcessor::new(Duration::from_secs(config.keepalive.timeout_secs));

    let gateway = Gateway::bind(config.listen.address, processor).await?;
    gateway.run().await?;
    Ok(())
}
