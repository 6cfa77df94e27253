//! Error types for LLM calls

use thiserror::Error;

/// Result type for LLM calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors raised while asking a provider for a completion
#[derive(Error, Debug)]
pub enum LLMError {
    /// Transport failure (connect, timeout, body read)
    #[cfg(feature = "reqwest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the credentials (HTTP 401)
    #[error("Authentication rejected by the provider")]
    Authentication,

    /// HTTP 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// HTTP 400, or a request refused before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP 404
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Any other non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The body could not be interpreted
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Missing credentials or bad settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LLMError {
    /// Map a non-success HTTP status and its body to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 => Self::Authentication,
            429 => Self::RateLimited(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::Api { status, body },
        }
    }

    /// Read a required environment variable
    pub fn require_env(name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| Self::Configuration(format!("{name} environment variable not set")))
    }
}
