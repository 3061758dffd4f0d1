//! Turn coordination.
//!
//! ```text
//! (user_id, message)
//!       │
//!       ▼
//! ContextStore ── snapshot ──▶ route() ──▶ registry lookup
//!                                               │
//!                                               ▼
//!                                     Agent::invoke (catch_unwind)
//!                                               │
//!       ┌───────────────────────────────────────┘
//!       ▼
//! record_turn + learning signals ──▶ Turn
//! ```
//!
//! The registry is only write-locked while a rebuilt map is swapped in.
//! Dispatch clones the agent handle and releases the lock before invoking.

use futures::FutureExt;
use learncoach_config::AppConfig;
use learncoach_core::error::ProviderError;
use learncoach_core::provider::Provider;
use learncoach_core::tool::ToolCall;
use learncoach_tools::assessment::{analyze_student_input, assess_code_sample};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::adapter::{Agent, AgentError, AgentReply, LlmAgent};
use crate::context::{ContextLimits, ContextStore, SkillLevel, UserContext, lock};
use crate::kind::AgentKind;
use crate::prompts::system_instruction;
use crate::router::route;

/// Builds one agent per kind. `Ok(None)` means the kind is disabled.
pub trait AgentFactory: Send + Sync {
    fn build(&self, kind: AgentKind) -> Result<Option<Arc<dyn Agent>>, AgentError>;
}

/// Builds [`LlmAgent`]s from the application config and a shared provider.
pub struct LlmAgentFactory {
    config: AppConfig,
    provider: Arc<dyn Provider>,
}

impl LlmAgentFactory {
    pub fn new(config: AppConfig, provider: Arc<dyn Provider>) -> Self {
        Self { config, provider }
    }

    /// Build the provider named in `config` and wrap it.
    pub fn from_config(config: AppConfig) -> Result<Self, ProviderError> {
        let provider = learncoach_providers::build_from_config(&config)?;
        Ok(Self::new(config, provider))
    }
}

impl AgentFactory for LlmAgentFactory {
    fn build(&self, kind: AgentKind) -> Result<Option<Arc<dyn Agent>>, AgentError> {
        let name = kind.as_str();
        if !self.config.agent_enabled(name) {
            return Ok(None);
        }

        let tools = learncoach_tools::registry_for(name, &self.config.learning.subject)
            .ok_or_else(|| AgentError::Build(format!("no tool set for agent '{name}'")))?;

        let agent = LlmAgent::new(
            name,
            Arc::clone(&self.provider),
            self.config.model_for(name),
            system_instruction(kind),
            tools,
        )
        .with_generation(self.config.generation_for(name))
        .with_max_tool_rounds(self.config.runtime.max_tool_rounds)
        .with_timeout(Duration::from_secs(self.config.runtime.request_timeout_secs));

        Ok(Some(Arc::new(agent)))
    }
}

/// A dispatch that could not reach an agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Error: Agent '{0}' not found.")]
    UnknownAgent(String),
}

/// The outcome of one dispatched turn.
#[derive(Debug)]
pub struct Turn {
    /// The agent that handled the turn.
    pub agent: String,
    pub reply: Result<AgentReply, AgentError>,
}

impl Turn {
    /// The reply text, or the error's display form.
    pub fn text(&self) -> String {
        match &self.reply {
            Ok(reply) => reply.text.clone(),
            Err(e) => e.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.reply.is_ok()
    }
}

type Registry = HashMap<String, Arc<dyn Agent>>;

pub struct Coordinator {
    factory: Arc<dyn AgentFactory>,
    registry: RwLock<Registry>,
    store: ContextStore,
}

impl Coordinator {
    /// Create a coordinator and build its agents.
    pub fn new(factory: Arc<dyn AgentFactory>, limits: ContextLimits) -> Self {
        let coordinator = Self {
            factory,
            registry: RwLock::new(HashMap::new()),
            store: ContextStore::new(limits),
        };
        coordinator.initialize_registry();
        coordinator
    }

    /// Wire the LLM-backed agents described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let limits = ContextLimits::from(&config.context);
        let factory = LlmAgentFactory::from_config(config.clone())?;
        Ok(Self::new(Arc::new(factory), limits))
    }

    /// Build one agent per kind and swap the result in as the registry.
    ///
    /// Failed builds are logged and skipped. Returns the number installed.
    pub fn initialize_registry(&self) -> usize {
        let mut agents = Registry::new();
        for kind in AgentKind::ALL {
            match self.factory.build(kind) {
                Ok(Some(agent)) => {
                    agents.insert(kind.as_str().to_string(), agent);
                }
                Ok(None) => info!(agent = %kind, "Agent disabled"),
                Err(e) => warn!(agent = %kind, "Failed to initialize agent: {e}"),
            }
        }

        let count = agents.len();
        *self.registry.write().unwrap_or_else(PoisonError::into_inner) = agents;
        info!(agents = count, "Agent registry initialized");
        count
    }

    fn agent(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Handle one turn for `user_id`.
    ///
    /// With no `agent_name` the router picks the agent. Agent failures and
    /// panics are recorded in history and returned inside the [`Turn`]; only
    /// an unresolvable agent name is an `Err`, and it leaves the store untouched.
    pub async fn handle_turn(
        &self,
        agent_name: Option<&str>,
        message: &str,
        user_id: &str,
    ) -> Result<Turn, DispatchError> {
        // A named agent is resolved before the store is touched, so an unknown
        // name never creates a context or evicts anyone.
        let name = match agent_name {
            Some(name) => name.to_string(),
            None => {
                let ctx = self.store.get_or_create(user_id);
                let snapshot = lock(&ctx).clone();
                route(message, &snapshot).as_str().to_string()
            }
        };

        let Some(agent) = self.agent(&name) else {
            warn!(user_id, agent = %name, "Dispatch to unknown agent");
            return Err(DispatchError::UnknownAgent(name));
        };

        debug!(user_id, agent = %name, "Dispatching turn");

        let reply = match AssertUnwindSafe(agent.invoke(message)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let details = panic_message(panic.as_ref());
                warn!(user_id, agent = %name, "Agent panicked: {details}");
                Err(AgentError::Panicked(details))
            }
        };

        let turn = Turn { agent: name, reply };
        self.store.record_turn(user_id, message, &turn.agent, &turn.text());
        if let Ok(reply) = &turn.reply {
            self.apply_learning_signals(user_id, &turn.agent, message, reply);
        }
        Ok(turn)
    }

    fn apply_learning_signals(
        &self,
        user_id: &str,
        agent: &str,
        message: &str,
        reply: &AgentReply,
    ) {
        let Ok(kind) = agent.parse::<AgentKind>() else {
            return;
        };

        match kind {
            AgentKind::Assessment => {
                let level = reply
                    .tool_calls
                    .iter()
                    .filter_map(reported_level)
                    .last()
                    .or_else(|| {
                        SkillLevel::from_label(analyze_student_input(message).detected_experience)
                    });
                if let Some(level) = level {
                    debug!(user_id, level = %level, "Skill level assessed");
                    self.store.set_skill_level(user_id, level);
                }
            }
            AgentKind::Teaching => self.record_topics(user_id, reply, "teach_python_concept"),
            AgentKind::Practice => self.record_topics(user_id, reply, "generate_python_exercise"),
            AgentKind::Curriculum | AgentKind::Progress => {}
        }
    }

    fn record_topics(&self, user_id: &str, reply: &AgentReply, tool: &str) {
        for call in reply.tool_calls.iter().filter(|c| c.name == tool) {
            if let Some(topic) = string_arg(call, "topic")
                && self.store.record_topic(user_id, topic)
            {
                debug!(user_id, topic, "Topic learned");
            }
        }
    }

    /// Registered agent names, in kind order.
    pub fn agent_names(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = AgentKind::ALL
            .iter()
            .map(|k| k.as_str())
            .filter(|n| registry.contains_key(*n))
            .map(str::to_string)
            .collect();
        let mut extra: Vec<String> = registry
            .keys()
            .filter(|k| k.parse::<AgentKind>().is_err())
            .cloned()
            .collect();
        extra.sort();
        names.extend(extra);
        names
    }

    pub fn agents_count(&self) -> usize {
        self.registry.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Users currently resident in the context store.
    pub fn active_users(&self) -> usize {
        self.store.len()
    }

    /// Snapshot of one user's context.
    pub fn context(&self, user_id: &str) -> Option<UserContext> {
        self.store.snapshot(user_id)
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }
}

fn string_arg<'a>(call: &'a ToolCall, key: &str) -> Option<&'a str> {
    call.arguments.get(key).and_then(|v| v.as_str())
}

/// The skill level an assessment tool call implies, if any.
fn reported_level(call: &ToolCall) -> Option<SkillLevel> {
    match call.name.as_str() {
        "assess_learning_profile" => {
            string_arg(call, "experience").and_then(SkillLevel::from_label)
        }
        "assess_with_code_sample" => string_arg(call, "code_sample")
            .and_then(|code| SkillLevel::from_label(assess_code_sample(code).assessed_level)),
        "analyze_student_input" => string_arg(call, "student_input").and_then(|input| {
            SkillLevel::from_label(analyze_student_input(input).detected_experience)
        }),
        _ => None,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
