use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::{debug, warn};

use crate::events::EventSender;
use crate::model::{ModelClient, ModelError, ModelReply};
use crate::store::ConversationStore;
use crate::{Message, ToolCall};

/// Upper bound on model/tool round-trips within one turn. The model
/// requesting tools this many times in a row fails the turn instead of
/// looping forever.
const MAX_TOOL_ROUNDS: usize = 8;

/// One model invocation over the conversation so far.
pub trait ModelStep: Send + Sync {
    async fn step(
        &self,
        messages: &[Message],
        events: &EventSender,
    ) -> Result<ModelReply, ModelError>;
}

impl ModelStep for ModelClient {
    async fn step(
        &self,
        messages: &[Message],
        events: &EventSender,
    ) -> Result<ModelReply, ModelError> {
        self.stream_chat(messages, events).await
    }
}

/// Tool lookup and execution. The defaults delegate to the process-wide
/// registry.
pub trait ToolDispatch: Send + Sync {
    fn recognizes(&self, name: &str) -> bool {
        rill_shared::has_tool(name)
    }

    async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        rill_shared::use_tool(name, args).await
    }
}

pub struct RegistryTools;

impl ToolDispatch for RegistryTools {}

enum TurnPhase {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done,
}

/// Runs one full turn: claim the conversation, append the user message,
/// cycle model and tools until the model answers, then emit the terminal
/// frame. Exactly one `end` on success, exactly one `error` otherwise.
pub async fn run_turn(
    store: &ConversationStore,
    model: &impl ModelStep,
    tools: &impl ToolDispatch,
    conversation_id: &str,
    is_new: bool,
    message: String,
    events: &EventSender,
) {
    if let Err(e) = store.begin_turn(conversation_id) {
        events.error(e.to_string());
        return;
    }

    if is_new {
        events.checkpoint(conversation_id);
    }

    store.append(conversation_id, Message::user(message));

    let result = drive(store, model, tools, conversation_id, events).await;
    store.end_turn(conversation_id);

    match result {
        Ok(()) => events.end(),
        Err(e) => {
            warn!(conversation_id, error = %e, "turn failed");
            events.error(e.to_string());
        }
    }
}

async fn drive(
    store: &ConversationStore,
    model: &impl ModelStep,
    tools: &impl ToolDispatch,
    conversation_id: &str,
    events: &EventSender,
) -> Result<()> {
    let mut phase = TurnPhase::AwaitingModel;
    let mut rounds = 0;

    loop {
        if events.is_closed() {
            debug!(conversation_id, "client went away, stopping turn");
            return Ok(());
        }

        phase = match phase {
            TurnPhase::AwaitingModel => {
                let history = store.history(conversation_id);
                let reply = model.step(&history, events).await?;
                store.append(conversation_id, reply.to_message());

                match reply.tool_calls {
                    Some(calls) if !calls.is_empty() => TurnPhase::ExecutingTools(calls),
                    _ => TurnPhase::Done,
                }
            }
            TurnPhase::ExecutingTools(calls) => {
                rounds += 1;
                if rounds > MAX_TOOL_ROUNDS {
                    return Err(anyhow!(
                        "model requested tools for {MAX_TOOL_ROUNDS} rounds in a row, giving up"
                    ));
                }

                for call in calls {
                    let name = &call.function.name;
                    if !tools.recognizes(name) {
                        // Calls to tools we don't know are dropped, not
                        // errored; the model carries on without a result.
                        debug!(tool = %name, "dropping call to unrecognized tool");
                        continue;
                    }

                    let args: Value = serde_json::from_str(&call.function.arguments)
                        .map_err(|e| anyhow!("tool '{name}' got malformed arguments: {e}"))?;

                    debug!(tool = %name, %args, "invoking tool");
                    let result = tools
                        .invoke(name, args)
                        .await
                        .map_err(|e| anyhow!("tool '{name}' failed: {e}"))?;

                    store.append(conversation_id, Message::tool(result, call.id));
                }

                TurnPhase::AwaitingModel
            }
            TurnPhase::Done => break,
        };
    }

    Ok(())
}
