//! The turn loop: model call, routing decision, tool dispatch, repeat.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::format::search_summary;
use crate::message::{Message, ToolCall};
use crate::model::ChatModel;
use crate::store::SessionStore;
use crate::tools::ToolRegistry;

/// Output fragments are pushed here in emission order; a consumer may start
/// reading while the turn is still producing.
pub type FragmentSink = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    CallTools,
    Stop,
}

/// The sole branching decision of the loop: an assistant message with
/// pending tool calls is never the final answer.
pub fn decide(last: &Message) -> NextStep {
    if last.tool_calls.is_empty() {
        NextStep::Stop
    } else {
        NextStep::CallTools
    }
}

pub struct TurnEngine {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    store: SessionStore,
    max_tool_rounds: usize,
}

impl TurnEngine {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        store: SessionStore,
        max_tool_rounds: usize,
    ) -> Self {
        Self { model, tools, store, max_tool_rounds }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run one turn for `thread_id`, streaming user-visible fragments into
    /// `sink`. The session stays locked for the whole turn, so turns on the
    /// same thread id are serialized while other threads proceed freely.
    ///
    /// On failure the messages appended so far remain valid history; only
    /// the turn itself is abandoned.
    pub async fn run_turn(
        &self,
        thread_id: &str,
        user_text: &str,
        sink: &FragmentSink,
    ) -> Result<(), AgentError> {
        let session = self.store.get_or_create(thread_id).await;
        let mut session = session.lock().await;
        session.messages.push(Message::user(user_text));

        for round in 0..self.max_tool_rounds {
            let assistant = self.model.invoke(&session.messages).await?;
            session.messages.push(assistant.clone());
            if !assistant.content.is_empty() {
                let _ = sink.send(assistant.content.clone());
            }
            match decide(&assistant) {
                NextStep::Stop => {
                    debug!(thread_id, round, "turn complete");
                    return Ok(());
                }
                NextStep::CallTools => {
                    for call in &assistant.tool_calls {
                        let (content, fragment) = self.execute_tool(call).await;
                        session.messages.push(Message::tool(call.id.clone(), content));
                        if let Some(fragment) = fragment {
                            let _ = sink.send(fragment);
                        }
                    }
                }
            }
        }
        warn!(thread_id, rounds = self.max_tool_rounds, "tool loop bound reached");
        Err(AgentError::ToolLoopExceeded { rounds: self.max_tool_rounds })
    }

    /// Buffered variant for callers without a streaming channel. Partial
    /// fragments produced before a failure are still returned, with the
    /// failure reported alongside them.
    pub async fn run_turn_collect(
        &self,
        thread_id: &str,
        user_text: &str,
    ) -> (Vec<String>, Result<(), AgentError>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = self.run_turn(thread_id, user_text, &tx).await;
        drop(tx);
        let mut fragments = Vec::new();
        while let Some(f) = rx.recv().await {
            fragments.push(f);
        }
        (fragments, result)
    }

    /// Unknown or failing tools become tool-role messages describing the
    /// failure, so the model can recover on the next round instead of the
    /// turn aborting.
    async fn execute_tool(&self, call: &ToolCall) -> (String, Option<String>) {
        let Some(tool) = self.tools.get(&call.name) else {
            let err = AgentError::UnknownTool(call.name.clone());
            warn!(tool = %call.name, "model requested a tool that is not registered");
            return (err.to_string(), None);
        };
        debug!(tool = %call.name, "dispatching tool call");
        match tool.run(call.arguments.clone()).await {
            Ok(value) => {
                let fragment = match search_summary(&value) {
                    Ok(summary) => summary,
                    Err(err) => {
                        warn!(tool = %call.name, %err, "dropping unrenderable tool result");
                        None
                    }
                };
                (value.to_string(), fragment)
            }
            Err(err) => {
                let err = AgentError::ToolExecution {
                    tool: call.name.clone(),
                    message: err.to_string(),
                };
                warn!(%err, "tool call failed");
                (err.to_string(), None)
            }
        }
    }
}
