use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};

use crate::Message;

#[derive(Default)]
struct Entry {
    messages: Vec<Message>,
    turn_active: bool,
}

/// Process-lifetime conversation history, keyed by checkpoint id. Nothing
/// survives a restart and nothing is ever evicted.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a conversation's messages. Ids never seen before read
    /// as an empty history rather than an error.
    pub fn history(&self, id: &str) -> Vec<Message> {
        let map = self.inner.lock().unwrap();
        map.get(id).map(|e| e.messages.clone()).unwrap_or_default()
    }

    pub fn append(&self, id: &str, message: Message) {
        let mut map = self.inner.lock().unwrap();
        map.entry(id.to_string()).or_default().messages.push(message);
    }

    /// Claims the conversation for one turn. At most one turn may run per
    /// id at a time; a second claim fails until `end_turn`.
    pub fn begin_turn(&self, id: &str) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        let entry = map.entry(id.to_string()).or_default();
        if entry.turn_active {
            bail!("conversation '{}' already has a turn in progress", id);
        }
        entry.turn_active = true;
        Ok(())
    }

    pub fn end_turn(&self, id: &str) {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get_mut(id) {
            entry.turn_active = false;
        }
    }
}
