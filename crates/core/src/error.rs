//! Error types for the LearnCoach domain.
//!
//! One `thiserror` enum per bounded context. Agents wrap [`ProviderError`];
//! [`ToolError`] is fed back to the model as text.

use thiserror::Error;

/// Failures talking to a model backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures resolving or running a lookup tool.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_status() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "model overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn tool_error_names_the_tool() {
        let err = ToolError::InvalidArguments {
            tool_name: "teach_python_concept".into(),
            reason: "missing field `topic`".into(),
        };
        assert!(err.to_string().contains("teach_python_concept"));
        assert!(err.to_string().contains("topic"));
    }
}
