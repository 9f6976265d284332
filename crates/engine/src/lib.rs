pub mod api;
pub mod config;
pub mod events;
pub mod model;
pub mod store;
pub mod turn;

use serde::{Deserialize, Serialize};

/// One entry of a conversation history, in the chat-completions wire shape.
/// Messages are append-only; nothing edits one after the fact.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A tool result, correlated to the call that produced it.
    pub fn tool(content: String, tool_call_id: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(tool_call_id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// `arguments` stays the raw JSON string the provider sent; it is parsed
/// just before the tool runs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

pub struct AppState {
    pub store: store::ConversationStore,
    pub model: model::ModelClient,
}
