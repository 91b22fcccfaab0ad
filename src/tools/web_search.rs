use serde_json::Value;
use tracing::debug;

use super::{Tool, ToolDefinition};
use crate::config::AgentConfig;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const MAX_RESULTS: usize = 2;

/// Hosted web search (Tavily). The result value keeps the provider's
/// `results` array of title/url/content entries so the model and the
/// summary formatter both see the ranked list.
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WebSearchTool {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.tavily_api_key.clone(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().into(),
            description: "Search the web for current information and return ranked results".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" },
                },
                "required": ["query"],
            }),
        }
    }

    fn run<'a>(
        &'a self,
        args: Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<Value>> + Send + 'a>>
    {
        Box::pin(async move {
            let query = args
                .get("query")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("missing query"))?;
            debug!(query, "web search");
            let resp = self
                .client
                .post(format!("{}/search", self.base_url.trim_end_matches('/')))
                .json(&serde_json::json!({
                    "api_key": self.api_key,
                    "query": query,
                    "max_results": MAX_RESULTS,
                }))
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                anyhow::bail!("search returned {}", status);
            }
            let body: Value = resp.json().await?;
            Ok(body)
        })
    }
}
