use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rill_engine::api;
use rill_engine::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rill_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Shutdown channel shared with the API server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(config, shutdown_rx).await {
            error!("API server crashed: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal");

    let _ = shutdown_tx.send(true);
    let _ = api_handle.await;

    info!("rill shutdown complete");
    Ok(())
}
