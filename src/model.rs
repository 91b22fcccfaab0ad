//! Chat model adapter: the hosted endpoint behind one async trait.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::{Message, Role, ToolCall};
use crate::tools::ToolDefinition;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the given history. Always a
    /// well-formed assistant message, even when content is empty and only
    /// tool calls are populated.
    async fn invoke(&self, history: &[Message]) -> Result<Message, AgentError>;
}

/// Azure OpenAI chat-completions client. Tool definitions are bound at
/// construction and sent with every request.
pub struct AzureOpenAiClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    tools: Vec<ToolDefinition>,
}

impl AzureOpenAiClient {
    pub fn new(config: &AgentConfig, tools: Vec<ToolDefinition>) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.openai_endpoint.trim_end_matches('/'),
            config.openai_deployment,
            config.openai_api_version,
        );
        Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            url,
            tools,
        }
    }

    #[cfg(test)]
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    fn build_body(&self, history: &[Message]) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = history.iter().map(message_to_wire).collect();
        let mut body = serde_json::json!({ "messages": messages });
        if !self.tools.is_empty() {
            let defs: Vec<serde_json::Value> = self
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            let obj = body.as_object_mut().unwrap();
            obj.insert("tools".into(), defs.into());
            obj.insert("tool_choice".into(), "auto".into());
        }
        body
    }
}

fn message_to_wire(msg: &Message) -> serde_json::Value {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let mut v = serde_json::json!({ "role": role, "content": msg.content });
    let obj = v.as_object_mut().unwrap();
    if !msg.tool_calls.is_empty() {
        let calls: Vec<serde_json::Value> = msg
            .tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": { "name": tc.name, "arguments": tc.arguments.to_string() },
                })
            })
            .collect();
        obj.insert("tool_calls".into(), calls.into());
    }
    if let Some(id) = &msg.tool_call_id {
        obj.insert("tool_call_id".into(), id.clone().into());
    }
    v
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[async_trait]
impl ChatModel for AzureOpenAiClient {
    async fn invoke(&self, history: &[Message]) -> Result<Message, AgentError> {
        debug!(messages = history.len(), "model invoke");
        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&self.build_body(history))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::model_unavailable(format!(
                "chat completion returned {status}: {body}"
            )));
        }
        let parsed: WireChatResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::model_unavailable(format!("bad completion payload: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::model_unavailable("completion had no choices"))?;
        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                // arguments arrive as a JSON-encoded string; keep the raw
                // string when it does not parse
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();
        Ok(Message::assistant_with_tool_calls(
            choice.message.content.unwrap_or_default(),
            tool_calls,
        ))
    }
}
