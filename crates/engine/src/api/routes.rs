use std::sync::Arc;

use axum::{Router, routing::get};

use super::handlers;
use crate::AppState;

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/chat_stream/{message}", get(handlers::handle_chat_stream))
}
