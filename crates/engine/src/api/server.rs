use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::routes::create_router;
use crate::AppState;
use crate::config::Config;
use crate::model::ModelClient;
use crate::store::ConversationStore;

pub async fn start_server(config: Config, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let state = Arc::new(AppState {
        store: ConversationStore::new(),
        model: ModelClient::new(&config),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router().layer(cors).with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("rill API server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    // Wait for shutdown signal
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("shutting down API server");
}
