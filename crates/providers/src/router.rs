//! Backend selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use learncoach_config::AppConfig;
use learncoach_core::error::ProviderError;
use learncoach_core::provider::Provider;

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured model backend.
///
/// A missing API key is not an error here; the backend reports
/// `AuthenticationFailed` on first use, which the agents turn into a reply.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let timeout = Duration::from_secs(config.runtime.request_timeout_secs);

    if config.missing_api_key() {
        tracing::warn!(provider = %config.provider, "No API key configured; model calls will fail");
    }

    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "gemini" | "google" => {
            let mut p = GeminiProvider::new(api_key, timeout)?;
            if let Some(url) = &config.api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        name => {
            let base_url = match (&config.api_url, default_base_url(name)) {
                (Some(url), _) => url.clone(),
                (None, Some(url)) => url.to_string(),
                (None, None) => {
                    return Err(ProviderError::NotConfigured(format!(
                        "Unknown provider '{name}': set api_url for OpenAI-compatible endpoints"
                    )));
                }
            };
            Arc::new(OpenAiCompatProvider::new(name, base_url, api_key, timeout)?)
        }
    };

    tracing::debug!(provider = provider.name(), "Model backend ready");
    Ok(provider)
}

/// Base URLs for well-known OpenAI-compatible backends.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        _ => None,
    }
}
