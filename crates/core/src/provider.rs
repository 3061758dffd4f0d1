//! Provider trait: the abstraction over hosted model backends.
//!
//! A Provider takes the messages of one agent invocation plus the agent's tool
//! definitions and returns the model's next message, which is either final text
//! or a batch of tool calls.
//!
//! Implementations: Gemini `generateContent`, OpenAI-compatible chat completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g. "gemini-2.5-flash")
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(default)]
    pub generation: GenerationParams,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Every model backend implements this trait. Agents call `complete()` without
/// knowing which backend is behind it, and tests substitute scripted fakes.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "gemini", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_defaults_match_base_settings() {
        let params = GenerationParams::default();
        assert!((params.temperature - 0.3).abs() < f32::EPSILON);
        assert!((params.top_p - 0.8).abs() < f32::EPSILON);
        assert_eq!(params.max_output_tokens, 1024);
    }

    #[test]
    fn request_omits_empty_tools() {
        let req = ProviderRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![Message::user("hi")],
            generation: GenerationParams::default(),
            tools: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
        assert_eq!(json["generation"]["max_output_tokens"], 1024);
    }
}
