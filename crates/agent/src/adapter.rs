//! Agent invocation adapter.
//!
//! An [`LlmAgent`] pairs a system instruction with a fixed tool set and runs
//! the model's function-calling loop client-side:
//!
//! 1. Send `[system, user]` plus the tool definitions
//! 2. If the model answers with tool calls, execute them against the agent's
//!    own registry and append the results
//! 3. Ask again until the model answers with text or the round limit is hit
//!
//! The whole invocation is bounded by a single timeout and attempted once.

use async_trait::async_trait;
use learncoach_core::error::ProviderError;
use learncoach_core::message::Message;
use learncoach_core::provider::{GenerationParams, Provider, ProviderRequest};
use learncoach_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can answer a student message.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Registry key, also used as the history role.
    fn name(&self) -> &str;

    /// Produce a reply. Must not touch user context.
    async fn invoke(&self, message: &str) -> Result<AgentReply, AgentError>;
}

/// The final model text plus the tools that ran while producing it.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub text: String,
    /// Successfully executed tool calls, in execution order
    pub tool_calls: Vec<ToolCall>,
}

impl AgentReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// An invocation failure. Displays as `Agent Error: <details>`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("Agent Error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Agent Error: no response within {secs}s")]
    Timeout { secs: u64 },

    #[error("Agent Error: model returned an empty response")]
    EmptyResponse,

    #[error("Agent Error: model kept calling tools after {rounds} rounds")]
    ToolRoundsExceeded { rounds: usize },

    #[error("Agent Error: agent panicked: {0}")]
    Panicked(String),

    #[error("Agent Error: {0}")]
    Build(String),
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

pub struct LlmAgent {
    name: String,
    provider: Arc<dyn Provider>,
    model: String,
    generation: GenerationParams,
    instruction: String,
    tools: ToolRegistry,
    max_tool_rounds: usize,
    timeout: Duration,
}

impl LlmAgent {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        instruction: impl Into<String>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            generation: GenerationParams::default(),
            instruction: instruction.into(),
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    /// Set how many rounds of tool execution the model may request.
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Set the bound on one whole invocation, tool rounds included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, message: &str) -> Result<AgentReply, AgentError> {
        let mut messages = vec![Message::system(&self.instruction), Message::user(message)];
        let tool_definitions = self.tools.definitions();
        let mut executed = Vec::new();
        let mut round = 0;

        loop {
            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                generation: self.generation,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    agent = %self.name,
                    model = %response.model,
                    total_tokens = usage.total_tokens,
                    "Model responded"
                );
            }

            if response.message.tool_calls.is_empty() {
                let text = response.message.content;
                if text.trim().is_empty() {
                    return Err(AgentError::EmptyResponse);
                }
                return Ok(AgentReply {
                    text,
                    tool_calls: executed,
                });
            }

            if round >= self.max_tool_rounds {
                warn!(agent = %self.name, rounds = round, "Tool round limit reached");
                return Err(AgentError::ToolRoundsExceeded { rounds: round });
            }
            round += 1;

            debug!(
                agent = %self.name,
                round,
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );

            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments)
                        .unwrap_or_else(|_| serde_json::json!({})),
                };

                match self.tools.execute(&call).await {
                    Ok(result) => {
                        let content = serde_json::to_string(&result.output)
                            .unwrap_or_else(|e| format!("Error: {e}"));
                        messages.push(Message::tool_result(&tc.id, &tc.name, content));
                        executed.push(call);
                    }
                    Err(e) => {
                        warn!(agent = %self.name, tool = %tc.name, "Tool execution failed: {e}");
                        let content = format!("Error: {e}");
                        messages.push(Message::tool_result(&tc.id, &tc.name, content));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, message: &str) -> Result<AgentReply, AgentError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.run(message)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(reply) => info!(
                agent = %self.name,
                latency_ms,
                tools_used = reply.tool_calls.len(),
                "Agent replied"
            ),
            Err(e) => warn!(agent = %self.name, latency_ms, "{e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        ScriptedProvider, make_text_response, make_tool_call, make_tool_call_response,
    };
    use learncoach_core::message::Role;

    fn teaching_agent(provider: Arc<ScriptedProvider>) -> LlmAgent {
        LlmAgent::new(
            "teaching",
            provider,
            "mock-model",
            "You are a patient Python teacher.",
            learncoach_tools::teaching_registry(),
        )
    }

    #[tokio::test]
    async fn plain_text_reply() {
        let provider = Arc::new(ScriptedProvider::single_text("Loops repeat code."));
        let agent = teaching_agent(provider.clone());

        let reply = agent.invoke("explain loops").await.unwrap();
        assert_eq!(reply.text, "Loops repeat code.");
        assert!(reply.tool_calls.is_empty());

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[1].content, "explain loops");
        assert_eq!(requests[0].tools[0].name, "teach_python_concept");
        assert_eq!(requests[0].model, "mock-model");
    }

    #[tokio::test]
    async fn tool_round_then_answer() {
        let provider = Arc::new(ScriptedProvider::tool_then_answer(
            vec![make_tool_call("teach_python_concept", serde_json::json!({"topic": "loops"}))],
            "Here is how loops work...",
        ));
        let agent = teaching_agent(provider.clone());

        let reply = agent.invoke("explain loops").await.unwrap();
        assert_eq!(reply.text, "Here is how loops work...");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].arguments["topic"], "loops");

        let second = &provider.requests()[1];
        let tool_msg = second.messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_name.as_deref(), Some("teach_python_concept"));
        assert!(
            tool_msg.content.contains("labeled boxes")
                || tool_msg.content.contains("assembly lines")
        );
    }

    #[tokio::test]
    async fn tool_failure_fed_back_to_model() {
        let provider = Arc::new(ScriptedProvider::tool_then_answer(
            vec![make_tool_call("no_such_tool", serde_json::json!({}))],
            "Sorry, let me just explain.",
        ));
        let agent = teaching_agent(provider.clone());

        let reply = agent.invoke("explain").await.unwrap();
        assert!(reply.tool_calls.is_empty());
        let tool_msg = provider.requests()[1].messages.last().cloned().unwrap();
        assert!(tool_msg.content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn provider_failure_is_typed() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::Network(
            "connection reset".into(),
        )));
        let err = teaching_agent(provider).invoke("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(ProviderError::Network(_))));
        assert!(err.to_string().starts_with("Agent Error: "));
    }

    #[tokio::test]
    async fn empty_text_is_an_error() {
        let provider = Arc::new(ScriptedProvider::single_text("   "));
        let err = teaching_agent(provider).invoke("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse));
    }

    #[tokio::test]
    async fn round_limit_stops_tool_loop() {
        let call = || {
            vec![make_tool_call("teach_python_concept", serde_json::json!({"topic": "loops"}))]
        };
        let provider = Arc::new(ScriptedProvider::new(vec![
            make_tool_call_response(call(), ""),
            make_tool_call_response(call(), ""),
            make_tool_call_response(call(), ""),
            make_text_response("never reached"),
        ]));
        let agent = teaching_agent(provider.clone()).with_max_tool_rounds(2);

        let err = agent.invoke("explain loops").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolRoundsExceeded { rounds: 2 }));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out() {
        let provider =
            Arc::new(ScriptedProvider::single_text("late").with_delay(Duration::from_secs(60)));
        let agent = teaching_agent(provider).with_timeout(Duration::from_secs(30));

        let err = agent.invoke("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout { secs: 30 }));
        assert_eq!(err.to_string(), "Agent Error: no response within 30s");
    }

    #[tokio::test]
    async fn generation_params_forwarded() {
        let provider = Arc::new(ScriptedProvider::single_text("ok"));
        let params = GenerationParams {
            temperature: 0.4,
            top_p: 0.8,
            max_output_tokens: 2048,
        };
        teaching_agent(provider.clone())
            .with_generation(params)
            .invoke("plan")
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].generation, params);
    }
}
