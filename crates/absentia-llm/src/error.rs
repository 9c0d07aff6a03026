//! Error types for extraction providers

use thiserror::Error;

/// Errors that can occur during a provider call
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The call did not finish within its deadline
    #[error("Provider call timed out after {0} ms")]
    Timeout(u64),

    /// Non-success HTTP status not covered by a more specific variant
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code returned
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The provider answered without any text
    #[error("Provider returned empty content")]
    EmptyContent,

    /// The response envelope could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials were refused
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider settings are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Map a non-success status and its body to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => LlmError::Authentication(body),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            429 => LlmError::RateLimitExceeded,
            _ => LlmError::HttpStatus { status, body },
        }
    }

    /// Map a transport error, keeping timeouts distinguishable
    pub(crate) fn from_transport(error: reqwest::Error, deadline_ms: u64) -> Self {
        if error.is_timeout() {
            LlmError::Timeout(deadline_ms)
        } else {
            LlmError::Communication(format!("Request failed: {}", error))
        }
    }
}
