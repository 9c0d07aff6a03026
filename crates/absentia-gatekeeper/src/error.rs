//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gate evaluation
///
/// Business outcomes (skip, hold, overlap) are not errors; only the
/// collaborators failing is.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Store error during evaluation
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
