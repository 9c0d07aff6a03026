//! Error types for the Extractor

use absentia_domain::ProviderAttempt;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// A provider answering with garbage is not an error; it yields a negative
/// `ParsedAbsenceRequest`. Only exhausting every provider fails a run.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Every configured provider failed or was skipped
    #[error("All extraction providers failed ({} attempted)", attempts.len())]
    ProviderUnavailable {
        /// Each attempt in priority order
        attempts: Vec<ProviderAttempt>,
    },

    /// The roster or taxonomy could not be loaded
    #[error("Context error: {0}")]
    Context(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Attempts recorded before the run gave up, if any
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            ExtractorError::ProviderUnavailable { attempts } => attempts,
            _ => &[],
        }
    }
}

impl From<absentia_llm::LlmError> for ExtractorError {
    fn from(e: absentia_llm::LlmError) -> Self {
        ExtractorError::Config(e.to_string())
    }
}
