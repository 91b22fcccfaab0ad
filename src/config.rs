use crate::error::AgentError;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

/// Environment-sourced configuration. All credentials are required up front
/// so a missing key fails at startup instead of on the first request.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub openai_api_key: String,
    pub openai_endpoint: String,
    pub openai_api_version: String,
    pub openai_deployment: String,
    pub tavily_api_key: String,
    pub max_tool_rounds: usize,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, AgentError> {
        dotenvy::dotenv().ok();
        let max_tool_rounds = match std::env::var("SWITCHBOARD_MAX_TOOL_ROUNDS") {
            Ok(v) => v.parse().map_err(|_| {
                AgentError::Configuration(format!("SWITCHBOARD_MAX_TOOL_ROUNDS is not a number: {v}"))
            })?,
            Err(_) => DEFAULT_MAX_TOOL_ROUNDS,
        };
        Ok(Self {
            openai_api_key: require("AZURE_OPENAI_API_KEY")?,
            openai_endpoint: require("AZURE_OPENAI_ENDPOINT")?,
            openai_api_version: require("AZURE_OPENAI_API_VERSION")?,
            openai_deployment: require("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            tavily_api_key: require("TAVILY_API_KEY")?,
            max_tool_rounds,
        })
    }
}

fn require(name: &str) -> Result<String, AgentError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AgentError::Configuration(format!(
            "required environment variable {name} is not set"
        ))),
    }
}
