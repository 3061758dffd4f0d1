//! Messages exchanged with a model backend during one agent invocation.
//!
//! These never outlive a single turn; the per-user transcript kept between
//! turns is a separate, truncated record owned by the agent crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Persona and tool-usage instructions
    System,
    /// Output of a tool the model asked for
    Tool,
}

/// A single message sent to or received from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// For tool results: the call being answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// For tool results: the tool that produced the output. Gemini keys
    /// function responses by name rather than by call id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// An assistant message that only requests tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<MessageToolCall>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, "");
        msg.tool_calls = tool_calls;
        msg
    }

    /// A tool result answering `tool_call_id`. `content` is the tool output as JSON text.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg.tool_name = Some(tool_name.into());
        msg
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    pub id: String,
    pub name: String,
    /// Arguments as JSON string
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("explain loops");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "explain loops");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_name.is_none());
    }

    #[test]
    fn tool_result_carries_call_id_and_name() {
        let msg = Message::tool_result("call_0", "teach_python_concept", r#"{"topic":"loops"}"#);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(msg.tool_name.as_deref(), Some("teach_python_concept"));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
