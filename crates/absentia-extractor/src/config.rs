//! Configuration for the Extractor

use absentia_llm::ProviderSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Deadline of a single provider call (seconds)
    pub call_timeout_secs: u64,

    /// Budget for all provider calls of one run (seconds)
    pub overall_timeout_secs: u64,

    /// Longest email body sent to a provider (characters)
    pub max_body_chars: usize,

    /// Most roster entries of each kind embedded in the prompt
    pub max_context_entries: usize,

    /// Providers in priority order
    pub providers: Vec<ProviderSettings>,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Get the run budget as a Duration
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.providers.iter().any(|p| p.enabled) {
            return Err("at least one enabled provider is required".to_string());
        }
        for provider in &self.providers {
            provider.validate()?;
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.overall_timeout_secs < self.call_timeout_secs {
            return Err("overall_timeout_secs cannot be less than call_timeout_secs".to_string());
        }
        if self.max_body_chars == 0 {
            return Err("max_body_chars must be greater than 0".to_string());
        }
        if self.max_context_entries == 0 {
            return Err("max_context_entries must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// OpenAI first, Anthropic as fallback
    fn default() -> Self {
        Self {
            call_timeout_secs: 30,
            overall_timeout_secs: 90,
            max_body_chars: 20_000,
            max_context_entries: 500,
            providers: vec![
                ProviderSettings::openai("gpt-4o-mini"),
                ProviderSettings::anthropic("claude-3-haiku-20240307"),
            ],
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: short deadlines, small prompts
    pub fn aggressive() -> Self {
        Self {
            call_timeout_secs: 10,
            overall_timeout_secs: 20,
            max_body_chars: 5_000,
            max_context_entries: 200,
            ..Self::default()
        }
    }

    /// Lenient preset: long deadlines for slow providers and long threads
    pub fn lenient() -> Self {
        Self {
            call_timeout_secs: 60,
            overall_timeout_secs: 180,
            max_body_chars: 50_000,
            max_context_entries: 2_000,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
