//! Google Gemini native `generateContent` provider.
//!
//! Key differences from OpenAI-compatible endpoints:
//! - System prompt is a top-level `systemInstruction`, not a message
//! - Assistant turns use the role `model`
//! - Tool calls are `functionCall` parts without ids; tool results are
//!   `functionResponse` parts matched back by function name
//! - `x-goog-api-key` header authentication

use async_trait::async_trait;
use learncoach_core::error::ProviderError;
use learncoach_core::message::{Message, MessageToolCall, Role};
use learncoach_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{API_VERSION}/models/{model}:generateContent", self.base_url)
    }

    /// Split system messages out; Gemini takes them as `systemInstruction`.
    fn extract_system(messages: &[Message]) -> (Option<GeminiContent>, Vec<&Message>) {
        let (system, rest): (Vec<&Message>, Vec<&Message>) =
            messages.iter().partition(|m| m.role == Role::System);

        let instruction = (!system.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system.iter().map(|m| Part::text(&m.content)).collect(),
        });
        (instruction, rest)
    }

    /// Convert messages to `contents`. Consecutive tool results collapse into
    /// one `user` turn, which is how Gemini expects parallel call results.
    fn to_api_contents(messages: &[&Message]) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User | Role::System => contents.push(GeminiContent {
                    role: Some("user".into()),
                    parts: vec![Part::text(&msg.content)],
                }),
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !msg.content.is_empty() {
                        parts.push(Part::text(&msg.content));
                    }
                    for tc in &msg.tool_calls {
                        let args = serde_json::from_str(&tc.arguments)
                            .unwrap_or_else(|_| serde_json::json!({}));
                        parts.push(Part {
                            function_call: Some(FunctionCall {
                                name: tc.name.clone(),
                                args,
                            }),
                            ..Part::default()
                        });
                    }
                    contents.push(GeminiContent {
                        role: Some("model".into()),
                        parts,
                    });
                }
                Role::Tool => {
                    let output: serde_json::Value = serde_json::from_str(&msg.content)
                        .unwrap_or_else(|_| serde_json::Value::String(msg.content.clone()));
                    // functionResponse.response must be a JSON object
                    let response = match output {
                        serde_json::Value::Object(_) => output,
                        other => serde_json::json!({ "result": other }),
                    };
                    let part = Part {
                        function_response: Some(FunctionResponse {
                            name: msg.tool_name.clone().unwrap_or_default(),
                            response,
                        }),
                        ..Part::default()
                    };

                    match contents.last_mut() {
                        Some(last)
                            if last.role.as_deref() == Some("user")
                                && last.parts.iter().all(|p| p.function_response.is_some()) =>
                        {
                            last.parts.push(part);
                        }
                        _ => contents.push(GeminiContent {
                            role: Some("user".into()),
                            parts: vec![part],
                        }),
                    }
                }
            }
        }

        contents
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<GeminiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }

    fn build_body(request: &ProviderRequest) -> GenerateContentRequest {
        let (system_instruction, messages) = Self::extract_system(&request.messages);
        GenerateContentRequest {
            system_instruction,
            contents: Self::to_api_contents(&messages),
            tools: Self::to_api_tools(&request.tools),
            generation_config: GenerationConfig {
                temperature: request.generation.temperature,
                top_p: request.generation.top_p,
                max_output_tokens: request.generation.max_output_tokens,
            },
        }
    }

    fn response_to_provider_response(
        resp: GenerateContentResponse,
        requested_model: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let candidate = match resp.candidates.into_iter().next() {
            Some(c) => c,
            None => {
                let reason = resp
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "no candidates".into());
                return Err(ProviderError::MalformedResponse(format!(
                    "Gemini returned no candidates: {reason}"
                )));
            }
        };

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if part.thought.unwrap_or(false) {
                continue;
            }
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(MessageToolCall {
                    id: format!("call_{}", tool_calls.len()),
                    name: call.name,
                    arguments: call.args.to_string(),
                });
            }
        }

        if text.is_empty() && tool_calls.is_empty() {
            return Err(ProviderError::MalformedResponse(format!(
                "Gemini candidate had no content (finishReason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let mut message = Message::assistant(text);
        message.tool_calls = tool_calls;

        let usage = resp.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: resp.model_version.unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

#[async_trait]
impl learncoach_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = self.endpoint(&request.model);
        let body = Self::build_body(&request);

        debug!(
            provider = "gemini",
            model = %request.model,
            tools = request.tools.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(crate::error_for_status(status, &request.model, error_body));
        }

        let api_resp: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::MalformedResponse(format!("Failed to parse Gemini response: {e}"))
            })?;

        Self::response_to_provider_response(api_resp, &request.model)
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
