//! Provider settings and construction

use crate::anthropic::{self, AnthropicProvider};
use crate::openai::{self, OpenAiProvider};
use crate::pricing::TokenPricing;
use crate::{ExtractionProvider, LlmError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Wire protocol of a provider entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Anthropic messages
    Anthropic,
}

impl ProviderKind {
    /// Base URL used when an entry does not set one
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => openai::DEFAULT_BASE_URL,
            ProviderKind::Anthropic => anthropic::DEFAULT_BASE_URL,
        }
    }
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_enabled() -> bool {
    true
}

/// One entry of the provider priority list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Wire protocol
    pub kind: ProviderKind,

    /// Name used in logs and metadata
    pub name: String,

    /// Inline API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Base URL; the kind's public endpoint when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model id
    pub model: String,

    /// Cost per 1000 tokens
    #[serde(default)]
    pub pricing: TokenPricing,

    /// Completion budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Disabled entries are skipped when building the provider list
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ProviderSettings {
    /// OpenAI entry reading its key from `OPENAI_API_KEY`
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            name: "openai".to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: None,
            model: model.into(),
            pricing: TokenPricing::new(0.15, 0.6),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            enabled: true,
        }
    }

    /// Anthropic entry reading its key from `ANTHROPIC_API_KEY`
    pub fn anthropic(model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            name: "anthropic".to_string(),
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            base_url: None,
            model: model.into(),
            pricing: TokenPricing::new(0.25, 1.25),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            enabled: true,
        }
    }

    /// Base URL after defaulting
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    /// Validate the entry without touching the environment
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("provider name must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err(format!("provider '{}' has no model", self.name));
        }
        if self.api_key.is_none() && self.api_key_env.is_none() {
            return Err(format!("provider '{}' needs api_key or api_key_env", self.name));
        }
        if self.max_tokens == 0 {
            return Err(format!("provider '{}': max_tokens must be greater than 0", self.name));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("provider '{}': temperature must be in [0, 2]", self.name));
        }
        if !self.pricing.is_valid() {
            return Err(format!("provider '{}': pricing must be non-negative", self.name));
        }
        Ok(())
    }

    /// Resolve the API key, consulting `lookup` for `api_key_env`
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        match &self.api_key_env {
            Some(var) => lookup(var).filter(|key| !key.is_empty()).ok_or_else(|| {
                LlmError::Configuration(format!(
                    "provider '{}': environment variable {} is not set",
                    self.name, var
                ))
            }),
            None => Err(LlmError::Configuration(format!(
                "provider '{}' has no API key",
                self.name
            ))),
        }
    }
}

/// Build a provider from its settings, reading the process environment for
/// `api_key_env`
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn ExtractionProvider>, LlmError> {
    settings.validate().map_err(LlmError::Configuration)?;
    let api_key = settings.resolve_api_key_with(|var| std::env::var(var).ok())?;
    let base_url = settings.effective_base_url();

    let provider: Arc<dyn ExtractionProvider> = match settings.kind {
        ProviderKind::OpenAi => Arc::new(
            OpenAiProvider::new(base_url, api_key, &settings.model)?
                .with_name(&settings.name)
                .with_pricing(settings.pricing)
                .with_max_tokens(settings.max_tokens)
                .with_temperature(settings.temperature),
        ),
        ProviderKind::Anthropic => Arc::new(
            AnthropicProvider::new(base_url, api_key, &settings.model)?
                .with_name(&settings.name)
                .with_pricing(settings.pricing)
                .with_max_tokens(settings.max_tokens)
                .with_temperature(settings.temperature),
        ),
    };
    Ok(provider)
}
