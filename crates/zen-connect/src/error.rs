//! Adapter Error Types

use thiserror::Error;
use zen_portfolio::PortfolioError;

/// Result type alias
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors raised by the external adapters
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure: connection refused, DNS, TLS, timeout
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectError {
    pub fn api(service: &'static str, status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            service,
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

impl From<ConnectError> for PortfolioError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Http(e) => Self::StoreUnavailable(e.to_string()),
            ConnectError::Io(e) => Self::Io(e),
            ConnectError::Serialization(e) => Self::Serialization(e),
            ConnectError::Config(msg) => Self::Config(msg),
            api @ ConnectError::Api { .. } => Self::Store(api.to_string()),
        }
    }
}
