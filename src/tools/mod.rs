use serde::Serialize;
use serde_json::Value;

use crate::config::AgentConfig;

pub mod web_search;

/// Function-call schema advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn definition(&self) -> ToolDefinition;
    fn run<'a>(
        &'a self,
        args: Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<Value>> + Send + 'a>>;
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_default_tools(config: &AgentConfig) -> Self {
        let mut r = Self::new();
        r.register(Box::new(web_search::WebSearchTool::new(config)));
        r
    }

    pub fn register(&mut self, t: Box<dyn Tool>) {
        self.tools.push(t);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().map(|b| b.as_ref()).find(|t| t.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
