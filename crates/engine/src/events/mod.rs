use std::collections::HashMap;

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub use rill_shared::events::ChatEvent;

// One broadcast channel per in-flight request, keyed by request id.
static EVENT_CHANNELS: Lazy<std::sync::Mutex<HashMap<String, broadcast::Sender<ChatEvent>>>> =
    Lazy::new(|| std::sync::Mutex::new(HashMap::new()));

/// Create a new event channel for a request
pub fn create_channel(id: String) -> broadcast::Receiver<ChatEvent> {
    let mut channels = EVENT_CHANNELS.lock().unwrap();

    let (tx, rx) = broadcast::channel(256);
    channels.insert(id, tx);

    rx
}

/// Send an event to a specific channel
pub fn send_event(id: &str, event: ChatEvent) {
    let channels = EVENT_CHANNELS.lock().unwrap();
    if let Some(tx) = channels.get(id) {
        let _ = tx.send(event); // Ignore if no receivers
    }
}

/// Clean up a channel when done
pub fn cleanup_channel(id: &str) {
    let mut channels = EVENT_CHANNELS.lock().unwrap();
    channels.remove(id);
}

/// Handle for pushing events into one request's channel.
#[derive(Clone)]
pub struct EventSender {
    request_id: String,
}

impl EventSender {
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    pub fn checkpoint(&self, checkpoint_id: &str) {
        send_event(
            &self.request_id,
            ChatEvent::Checkpoint {
                checkpoint_id: checkpoint_id.to_string(),
            },
        );
    }

    pub fn content(&self, content: String) {
        send_event(&self.request_id, ChatEvent::Content { content });
    }

    pub fn end(&self) {
        send_event(&self.request_id, ChatEvent::End);
        cleanup_channel(&self.request_id);
    }

    pub fn error(&self, message: String) {
        send_event(&self.request_id, ChatEvent::Error { message });
        cleanup_channel(&self.request_id);
    }

    /// True once every receiver is gone, which is how a client disconnect
    /// shows up here. The turn controller checks this between steps.
    pub fn is_closed(&self) -> bool {
        let channels = EVENT_CHANNELS.lock().unwrap();
        channels
            .get(&self.request_id)
            .map(|tx| tx.receiver_count() == 0)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_the_receiver_in_order() {
        let mut rx = create_channel("req-order".to_string());
        let sender = EventSender::new("req-order".to_string());

        sender.content("a".to_string());
        sender.content("b".to_string());
        sender.end();

        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::Content {
                content: "a".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::Content {
                content: "b".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ChatEvent::End);
    }

    #[test]
    fn terminal_events_remove_the_channel() {
        let _rx = create_channel("req-cleanup".to_string());
        let sender = EventSender::new("req-cleanup".to_string());
        assert!(!sender.is_closed());

        sender.end();
        assert!(sender.is_closed());
    }

    #[test]
    fn dropped_receiver_reads_as_closed() {
        let rx = create_channel("req-gone".to_string());
        let sender = EventSender::new("req-gone".to_string());

        drop(rx);
        assert!(sender.is_closed());

        cleanup_channel("req-gone");
    }
}
