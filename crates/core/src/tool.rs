//! Tool trait and registry — the agent's capabilities.
//!
//! Tools are what let the agent act in the world: run shell commands,
//! read/write files, fetch URLs. Each tool describes itself with a JSON
//! Schema and executes structured arguments.
//!
//! The registry's `dispatch` contract is deliberately infallible: unknown
//! names and execution failures are rendered to labeled text, so the agent
//! loop never needs error handling around tool execution.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool considers the execution successful. Blocked or
    /// not-found outcomes are unsuccessful results, not errors.
    pub success: bool,

    /// The textual output fed back into the conversation
    pub output: String,

    /// Optional structured data; rendered as pretty-printed JSON when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// A labeled unsuccessful outcome ([BLOCKED], [NOT FOUND], ...).
    pub fn labeled(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }
}

/// The core Tool trait.
///
/// Implementations live in the tools crate; both trust variants of a
/// capability (unrestricted and sandboxed) implement this same contract.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "file_ops").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for advertisement.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, constructed once at startup and passed by
/// reference to whatever builds the agent loop.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, for advertisement to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a tool by name and reduce the outcome to text.
    ///
    /// Never fails: unknown names and execution errors come back as labeled
    /// error text for the model to see.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            return format!("Error: unknown tool '{name}'");
        };

        match tool.execute(arguments).await {
            Ok(result) => match result.data {
                Some(data) => {
                    serde_json::to_string_pretty(&data).unwrap_or(result.output)
                }
                None => result.output,
            },
            Err(e) => format!("Error executing {name}: {e}"),
        }
    }
}
