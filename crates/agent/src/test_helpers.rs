//! Scripted providers and agents for tests.

use crate::adapter::{Agent, AgentError, AgentReply};
use learncoach_core::error::ProviderError;
use learncoach_core::message::{Message, MessageToolCall};
use learncoach_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use learncoach_core::tool::ToolCall;
use std::sync::Mutex;
use std::time::Duration;

/// A provider that returns a sequence of scripted results and records every
/// request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// First return tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![make_tool_call_response(tool_calls, ""), make_text_response(answer)])
    }

    /// Sleep before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let responses = self.responses.lock().unwrap();
        match responses.get(call) {
            Some(result) => result.clone(),
            None => panic!(
                "ScriptedProvider: no more responses (call #{}, have {})",
                call,
                responses.len()
            ),
        }
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ProviderResponse {
    let mut msg = Message::assistant(text);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// What a [`ScriptedAgent`] does when invoked.
#[derive(Clone)]
pub enum Behavior {
    Reply(AgentReply),
    Fail(AgentError),
    Panic,
    /// Sleep, then reply with the given text.
    Slow(Duration, String),
}

/// An [`Agent`] with canned behavior.
pub struct ScriptedAgent {
    name: String,
    behavior: Behavior,
}

impl ScriptedAgent {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
        }
    }

    pub fn replying(name: &str, text: &str) -> Self {
        Self::new(name, Behavior::Reply(AgentReply::text(text)))
    }

    /// Reply with `text` after having "executed" `tools`.
    pub fn with_tools(name: &str, text: &str, tools: Vec<(&str, serde_json::Value)>) -> Self {
        let tool_calls = tools
            .into_iter()
            .enumerate()
            .map(|(i, (tool, arguments))| ToolCall {
                id: format!("call_{i}"),
                name: tool.to_string(),
                arguments,
            })
            .collect();
        Self::new(
            name,
            Behavior::Reply(AgentReply {
                text: text.to_string(),
                tool_calls,
            }),
        )
    }
}

#[async_trait::async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _message: &str) -> Result<AgentReply, AgentError> {
        match &self.behavior {
            Behavior::Reply(reply) => Ok(reply.clone()),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Panic => panic!("{} blew up", self.name),
            Behavior::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(AgentReply::text(text.clone()))
            }
        }
    }
}
