//! Model backend implementations for LearnCoach.
//!
//! All providers implement the `learncoach_core::Provider` trait.
//! [`build_from_config`] selects the backend named in configuration.

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;

use learncoach_core::ProviderError;

/// Map a non-200 HTTP status to a provider error.
pub(crate) fn error_for_status(status: u16, model: &str, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after_secs: 5 },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
