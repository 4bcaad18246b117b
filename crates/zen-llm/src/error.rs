//! Error Types

use thiserror::Error;

/// Result type alias for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// LLM error types
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable (connection refused, DNS, TLS...)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider answered but the payload could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider returned no usable candidate
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::EmptyResponse(_) => "The AI service returned an empty answer.".into(),
            Self::RateLimited(_) => "The AI service is rate limiting requests. Please wait a moment.".into(),
            Self::Auth(_) => "AI authentication failed. Please check the API key.".into(),
            Self::Config(msg) => format!("AI service is not configured: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
