//! Error types for the pipeline

use absentia_domain::{AbsenceRecordId, LogStateError, ProcessingLogId, TransitionError};
use absentia_extractor::ExtractorError;
use absentia_gatekeeper::GatekeeperError;
use thiserror::Error;

/// Configuration file error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that stop a pipeline operation
///
/// Provider outages, unparseable answers and rule violations are not errors;
/// they are reported inside `ProcessEmailResponse`. What remains here is
/// infrastructure failure and misuse of the record or log lifecycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Store unreachable or rejected a write
    #[error("Store error: {0}")]
    Store(String),

    /// Context loading or extractor construction failed
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Gate construction or a store read inside the gate failed
    #[error(transparent)]
    Gate(#[from] GatekeeperError),

    /// Bad configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Log written outside its lifecycle
    #[error(transparent)]
    LogState(#[from] LogStateError),

    /// Illegal record status change
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// No such absence record
    #[error("Absence record not found: {0}")]
    RecordNotFound(AbsenceRecordId),

    /// No such processing log
    #[error("Processing log not found: {0}")]
    LogNotFound(ProcessingLogId),

    /// A thread panicked while holding the store
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl PipelineError {
    pub(crate) fn store(e: impl std::fmt::Display) -> Self {
        PipelineError::Store(e.to_string())
    }
}
