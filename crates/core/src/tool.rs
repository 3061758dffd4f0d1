//! Tool trait: deterministic capabilities an agent exposes to the model.
//!
//! Every LearnCoach tool is a keyed lookup over static tables with a default
//! branch, so `execute` returns structured JSON and only fails on bad arguments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Matches the model's tool call id
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    /// Structured output, handed back to the model verbatim
    pub output: serde_json::Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name the model calls this tool by.
    fn name(&self) -> &str;

    /// What this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the lookup.
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The fixed tool set of one agent.
///
/// Registration order is kept so the definitions sent to the model are stable.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Definitions for sending to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let output = tool.execute(call.arguments.clone()).await?;
        Ok(ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            output,
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
