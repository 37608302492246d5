//! Tool trait — synchronous question-answering over local state.
//!
//! The remote agent may ask the client to run a tool mid-conversation
//! (`client_tool_call`). Tools here only read local state — the current
//! context snapshot or a bounded suffix of the rolling transcript — and
//! return a JSON result. They never reach back out to the network.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ToolError;

/// A tool the remote agent can invoke against local state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, as configured on the remote agent.
    fn name(&self) -> &str;

    /// A short description of what this tool answers.
    fn description(&self) -> &str;

    /// Execute with the given arguments, returning a JSON result.
    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;
}

/// A registry of available tools, keyed by tool name.
///
/// The transport uses this to answer `client_tool_call` events: look up by
/// name, invoke, and wrap the outcome in exactly one tool result message.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Resolve and invoke a tool. An unrecognized name fails with
    /// [`ToolError::Unsupported`]; the caller converts any error into an
    /// error-flagged tool result rather than propagating it.
    pub async fn handle(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::Unsupported(name.to_string()))?;
        tool.invoke(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
