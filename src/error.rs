use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model unavailable: {message}")]
    ModelUnavailable { message: String },

    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool loop exceeded {rounds} rounds without a final answer")]
    ToolLoopExceeded { rounds: usize },

    #[error("malformed tool result: {0}")]
    MalformedToolResult(String),
}

impl AgentError {
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable { message: message.into() }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::ModelUnavailable { message: err.to_string() }
    }
}
