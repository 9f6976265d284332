use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
};
use futures_util::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::types::ChatStreamParams;
use crate::AppState;
use crate::events::{self, EventSender};
use crate::turn::{self, RegistryTools};

/// Streams one turn as server-sent events. With no `checkpoint_id` the
/// server starts a new conversation and announces its id in the first
/// frame; with one, the turn appends to that conversation's history.
pub async fn handle_chat_stream(
    State(state): State<Arc<AppState>>,
    Path(message): Path<String>,
    Query(params): Query<ChatStreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let request_id = Uuid::new_v4().to_string();
    let rx = events::create_channel(request_id.clone());

    let is_new = params.checkpoint_id.is_none();
    let conversation_id = params
        .checkpoint_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // The turn runs detached; this handler only relays its events.
    tokio::spawn(async move {
        let sender = EventSender::new(request_id);
        turn::run_turn(
            &state.store,
            &state.model,
            &RegistryTools,
            &conversation_id,
            is_new,
            message,
            &sender,
        )
        .await;
    });

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let json = serde_json::to_string(&event).unwrap();
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream)
}

pub async fn health_check() -> &'static str {
    "Rill is running"
}
