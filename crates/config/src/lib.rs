//! Configuration loading, validation, and management for LearnCoach.
//!
//! Loads configuration from `~/.learncoach/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use learncoach_core::GenerationParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.learncoach/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model backend: "gemini", "openai", "openrouter", "ollama", or any
    /// OpenAI-compatible name together with `api_url`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the backend's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model used by agents without their own override
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-agent model and sampling overrides
    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub learning: LearningConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.8
}
fn default_max_output_tokens() -> u32 {
    1024
}
fn default_log_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("log_level", &self.log_level)
            .field("agents", &self.agents)
            .field("context", &self.context)
            .field("runtime", &self.runtime)
            .field("gateway", &self.gateway)
            .field("learning", &self.learning)
            .finish()
    }
}

/// Overrides for one agent. Unset fields fall back to the top-level values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Disabled agents are left out of the registry
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AgentSettings {
    fn tuned(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            model: None,
            temperature: Some(temperature),
            top_p: None,
            max_output_tokens: Some(max_output_tokens),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "default_assessment")]
    pub assessment: AgentSettings,
    #[serde(default = "default_curriculum")]
    pub curriculum: AgentSettings,
    #[serde(default = "default_teaching")]
    pub teaching: AgentSettings,
    #[serde(default = "default_practice")]
    pub practice: AgentSettings,
    #[serde(default = "default_progress")]
    pub progress: AgentSettings,
}

// Assessment and progress stay conservative; curriculum gets room for week plans.
fn default_assessment() -> AgentSettings {
    AgentSettings::tuned(0.2, 1024)
}
fn default_curriculum() -> AgentSettings {
    AgentSettings::tuned(0.4, 2048)
}
fn default_teaching() -> AgentSettings {
    AgentSettings::tuned(0.3, 1536)
}
fn default_practice() -> AgentSettings {
    AgentSettings::tuned(0.3, 1280)
}
fn default_progress() -> AgentSettings {
    AgentSettings::tuned(0.2, 1024)
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            assessment: default_assessment(),
            curriculum: default_curriculum(),
            teaching: default_teaching(),
            practice: default_practice(),
            progress: default_progress(),
        }
    }
}

impl AgentsConfig {
    /// Settings for an agent by name.
    pub fn get(&self, name: &str) -> Option<&AgentSettings> {
        match name {
            "assessment" => Some(&self.assessment),
            "curriculum" => Some(&self.curriculum),
            "teaching" => Some(&self.teaching),
            "practice" => Some(&self.practice),
            "progress" => Some(&self.progress),
            _ => None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, &AgentSettings)> {
        [
            ("assessment", &self.assessment),
            ("curriculum", &self.curriculum),
            ("teaching", &self.teaching),
            ("practice", &self.practice),
            ("progress", &self.progress),
        ]
        .into_iter()
    }
}

/// Bounds on the in-memory user context store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Transcript records kept per user (two per turn)
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Users tracked at once; the least recently active is evicted beyond this
    #[serde(default = "default_max_users")]
    pub max_users: usize,

    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
}

fn default_max_history() -> usize {
    20
}
fn default_max_users() -> usize {
    1000
}
fn default_max_topics() -> usize {
    50
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            max_users: default_max_users(),
            max_topics: default_max_topics(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Upper bound on one agent invocation, tool rounds included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_max_tool_rounds() -> usize {
    5
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Requests per minute per client. Accepted but not enforced.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_rate_limit() -> u32 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    #[serde(default = "default_subject")]
    pub subject: String,

    /// User id assumed when a chat request names none
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

fn default_subject() -> String {
    "python".into()
}
fn default_user_id() -> String {
    "default_user".into()
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            default_user_id: default_user_id(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.learncoach/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and re-validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    ///
    /// API key: `LEARNCOACH_API_KEY`, `GEMINI_API_KEY`, `GOOGLE_API_KEY` (first
    /// set wins, only when the file has none). Also `LEARNCOACH_PROVIDER`,
    /// `LEARNCOACH_MODEL`, `LOG_LEVEL`, `HOST`, `PORT`, `RATE_LIMIT`.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("LEARNCOACH_API_KEY")
                .or_else(|| lookup("GEMINI_API_KEY"))
                .or_else(|| lookup("GOOGLE_API_KEY"));
        }
        if let Some(provider) = lookup("LEARNCOACH_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("LEARNCOACH_MODEL") {
            self.model = model;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if let Some(host) = lookup("HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(limit) = lookup("RATE_LIMIT") {
            match limit.parse() {
                Ok(limit) => self.gateway.rate_limit_per_minute = limit,
                Err(_) => tracing::warn!(value = %limit, "Ignoring invalid RATE_LIMIT"),
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".learncoach")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_sampling("top-level", self.temperature, self.top_p, self.max_output_tokens)?;

        for (name, agent) in self.agents.iter() {
            let params = self.generation_for(name);
            check_sampling(name, params.temperature, params.top_p, params.max_output_tokens)?;
            if agent.model.as_deref().is_some_and(str::is_empty) {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{name}.model must not be empty"
                )));
            }
        }

        if self.context.max_history < 2 || self.context.max_history % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "context.max_history must be an even number >= 2".into(),
            ));
        }
        if self.context.max_users == 0 {
            return Err(ConfigError::ValidationError("context.max_users must be > 0".into()));
        }
        if self.runtime.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.request_timeout_secs must be > 0".into(),
            ));
        }
        if self.runtime.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.max_tool_rounds must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Model id for an agent, falling back to the top-level model.
    pub fn model_for(&self, agent: &str) -> &str {
        self.agents
            .get(agent)
            .and_then(|a| a.model.as_deref())
            .unwrap_or(&self.model)
    }

    /// Effective sampling parameters for an agent.
    pub fn generation_for(&self, agent: &str) -> GenerationParams {
        let settings = self.agents.get(agent);
        GenerationParams {
            temperature: settings.and_then(|a| a.temperature).unwrap_or(self.temperature),
            top_p: settings.and_then(|a| a.top_p).unwrap_or(self.top_p),
            max_output_tokens: settings
                .and_then(|a| a.max_output_tokens)
                .unwrap_or(self.max_output_tokens),
        }
    }

    /// Unknown agent names count as enabled.
    pub fn agent_enabled(&self, agent: &str) -> bool {
        self.agents.get(agent).is_none_or(|a| a.enabled)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Local OpenAI-compatible servers run without a key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self.provider.as_str(), "ollama" | "vllm")
    }

    /// The configured backend needs a key and none is set.
    pub fn missing_api_key(&self) -> bool {
        self.requires_api_key() && !self.has_api_key()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn check_sampling(
    scope: &str,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::ValidationError(format!(
            "{scope}: temperature must be between 0.0 and 2.0"
        )));
    }
    if top_p <= 0.0 || top_p > 1.0 {
        return Err(ConfigError::ValidationError(format!(
            "{scope}: top_p must be in (0.0, 1.0]"
        )));
    }
    if max_output_tokens == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{scope}: max_output_tokens must be > 0"
        )));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            log_level: default_log_level(),
            agents: AgentsConfig::default(),
            context: ContextConfig::default(),
            runtime: RuntimeConfig::default(),
            gateway: GatewayConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
