use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rill_shared::Tool;

use crate::config::Config;
use crate::events::EventSender;
use crate::{FunctionCall, Message, ToolCall};

const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed stream chunk: {0}")]
    Stream(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
}

// Chat-completions stream chunks: each `data:` frame carries deltas for
// content and/or tool calls, the latter addressed by index.
#[derive(Deserialize, Debug)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize, Debug, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize, Debug)]
struct ToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Deserialize, Debug)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Everything one model step produced: the finished text, or the tool
/// calls the model wants executed (never both non-empty in practice).
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ModelReply {
    pub fn to_message(&self) -> Message {
        Message {
            role: "assistant".to_string(),
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_call_id: None,
        }
    }
}

/// Accumulates streamed deltas into a complete reply. Argument strings
/// arrive fragmented across chunks and are concatenated per call index.
#[derive(Default)]
struct ReplyAssembler {
    content: String,
    calls: Vec<PendingCall>,
}

#[derive(Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

impl ReplyAssembler {
    /// Folds one delta in, returning any new content fragment so the
    /// caller can forward it to the stream while the turn is running.
    fn absorb(&mut self, delta: Delta) -> Option<String> {
        let mut fragment = None;

        if let Some(content) = delta.content {
            if !content.is_empty() {
                self.content.push_str(&content);
                fragment = Some(content);
            }
        }

        if let Some(deltas) = delta.tool_calls {
            for d in deltas {
                while self.calls.len() <= d.index {
                    self.calls.push(PendingCall::default());
                }
                let call = &mut self.calls[d.index];

                if let Some(id) = d.id {
                    call.id = id;
                }
                if let Some(function) = d.function {
                    if let Some(name) = function.name {
                        call.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        call.arguments.push_str(&arguments);
                    }
                }
            }
        }

        fragment
    }

    fn finish(self) -> ModelReply {
        let tool_calls: Vec<ToolCall> = self
            .calls
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| ToolCall {
                id: c.id,
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: c.name,
                    arguments: if c.arguments.is_empty() {
                        "{}".to_string()
                    } else {
                        c.arguments
                    },
                },
            })
            .collect();

        ModelReply {
            content: if self.content.is_empty() {
                None
            } else {
                Some(self.content)
            },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
        }
    }
}

#[derive(Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ModelClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.groq_api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// One model invocation over the full history. Content deltas are
    /// pushed onto the event channel as they arrive; the assembled reply
    /// comes back once the provider closes the stream.
    pub async fn stream_chat(
        &self,
        messages: &[Message],
        events: &EventSender,
    ) -> Result<ModelReply, ModelError> {
        let tools = rill_shared::get_tools();
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            stream: true,
            tools: if tools.is_empty() { None } else { Some(&tools) },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        let mut assembler = ReplyAssembler::default();
        let mut done = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.extend_from_slice(&bytes);

            // Process complete lines; partial lines wait for more bytes.
            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    done = true;
                    break;
                }

                let chunk: StreamChunk = serde_json::from_str(data)?;
                if let Some(choice) = chunk.choices.into_iter().next() {
                    if let Some(fragment) = assembler.absorb(choice.delta) {
                        events.content(fragment);
                    }
                }
            }

            if done {
                break;
            }
        }

        Ok(assembler.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_fragments_accumulate() {
        let mut assembler = ReplyAssembler::default();

        let first = assembler.absorb(Delta {
            content: Some("Hel".to_string()),
            tool_calls: None,
        });
        let second = assembler.absorb(Delta {
            content: Some("lo".to_string()),
            tool_calls: None,
        });

        assert_eq!(first.as_deref(), Some("Hel"));
        assert_eq!(second.as_deref(), Some("lo"));

        let reply = assembler.finish();
        assert_eq!(reply.content.as_deref(), Some("Hello"));
        assert!(reply.tool_calls.is_none());
    }

    #[test]
    fn tool_call_arguments_reassemble_across_chunks() {
        let mut assembler = ReplyAssembler::default();

        assembler.absorb(Delta {
            content: None,
            tool_calls: Some(vec![ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                function: Some(FunctionDelta {
                    name: Some("WebSearch::search".to_string()),
                    arguments: Some("{\"qu".to_string()),
                }),
            }]),
        });
        assembler.absorb(Delta {
            content: None,
            tool_calls: Some(vec![ToolCallDelta {
                index: 0,
                id: None,
                function: Some(FunctionDelta {
                    name: None,
                    arguments: Some("ery\":\"paris\"}".to_string()),
                }),
            }]),
        });

        let reply = assembler.finish();
        let calls = reply.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "WebSearch::search");

        let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args["query"], "paris");
    }

    #[test]
    fn empty_arguments_default_to_an_object() {
        let mut assembler = ReplyAssembler::default();
        assembler.absorb(Delta {
            content: None,
            tool_calls: Some(vec![ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                function: Some(FunctionDelta {
                    name: Some("WebSearch::search".to_string()),
                    arguments: None,
                }),
            }]),
        });

        let reply = assembler.finish();
        assert_eq!(reply.tool_calls.unwrap()[0].function.arguments, "{}");
    }

    #[test]
    fn provider_chunk_parses() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
    }

    #[test]
    fn assistant_message_serializes_without_empty_fields() {
        let reply = ModelReply {
            content: Some("4".to_string()),
            tool_calls: None,
        };
        let json = serde_json::to_string(&reply.to_message()).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"4"}"#);
    }
}
