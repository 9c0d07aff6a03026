//! Pipeline configuration
//!
//! One TOML file configures the whole run: where the store lives, the
//! extraction providers and the decision gate.
//!
//! ```toml
//! database_path = "absentia.db"
//! created_by = "absence-pipeline"
//!
//! [gate]
//! confidence_threshold = 0.85
//!
//! [extractor]
//! call_timeout_secs = 20
//!
//! [[extractor.providers]]
//! kind = "openai"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! ```

use crate::ConfigError;
use absentia_extractor::ExtractorConfig;
use absentia_gatekeeper::GateConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default `created_by` written on records the pipeline creates
pub const DEFAULT_CREATED_BY: &str = "absence-pipeline";

/// Configuration for [`crate::AbsencePipeline`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Actor recorded as `created_by` on automatically created records
    pub created_by: String,

    /// Characters of the email body kept in the processing log
    pub log_excerpt_chars: usize,

    /// Decision gate settings
    pub gate: GateConfig,

    /// Extraction settings, providers last
    pub extractor: ExtractorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("absentia.db"),
            created_by: DEFAULT_CREATED_BY.to_string(),
            log_excerpt_chars: 500,
            gate: GateConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.created_by.trim().is_empty() {
            return Err(ConfigError::Invalid("created_by must not be empty".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".to_string()));
        }
        self.gate
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("gate: {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("extractor: {}", e)))?;
        Ok(())
    }
}
