//! Provider fallback orchestration

use crate::config::ExtractorConfig;
use crate::context::RequestContext;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::types::{EmailMessage, ExtractionReport};
use absentia_domain::{ExtractionMetadata, ProviderAttempt};
use absentia_llm::{build_provider, ExtractionProvider, LlmError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Calls providers in priority order and normalizes the first answer
pub struct ExtractionOrchestrator {
    providers: Vec<Arc<dyn ExtractionProvider>>,
    config: ExtractorConfig,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator over ready-made providers
    ///
    /// `config.providers` is ignored; the timeouts and limits apply.
    pub fn new(providers: Vec<Arc<dyn ExtractionProvider>>, config: ExtractorConfig) -> Self {
        Self { providers, config }
    }

    /// Validate `config` and build its enabled providers
    pub fn from_config(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let providers = config
            .providers
            .iter()
            .filter(|settings| settings.enabled)
            .map(build_provider)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(providers, config))
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Provider names in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Extract an absence request from `email`
    ///
    /// Fails only when no provider produced text. A provider that answers
    /// with something unparseable yields a negative result.
    pub async fn extract(
        &self,
        context: &RequestContext,
        email: &EmailMessage,
    ) -> Result<ExtractionReport, ExtractorError> {
        let prompt = PromptBuilder::new(context, email, self.config.max_body_chars).build();
        debug!("Prompt length: {} chars", prompt.system.len() + prompt.user.len());

        let run_started = Instant::now();
        let budget = self.config.overall_timeout();
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let remaining = budget.saturating_sub(run_started.elapsed());
            if remaining.is_zero() {
                warn!("Run budget exhausted before trying provider '{}'", provider.name());
                attempts.push(ProviderAttempt {
                    provider: provider.name().to_string(),
                    succeeded: false,
                    error: Some("skipped: run budget exhausted".to_string()),
                    latency_ms: 0,
                });
                continue;
            }

            let deadline = self.config.call_timeout().min(remaining);
            debug!("Calling provider '{}' with deadline {:?}", provider.name(), deadline);

            let call_started = Instant::now();
            let result = match timeout(deadline, provider.extract(&prompt, deadline)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(millis(deadline))),
            };
            let latency_ms = millis(call_started.elapsed());

            match result {
                Ok(completion) => {
                    info!(
                        "Provider '{}' answered in {} ms ({} tokens)",
                        provider.name(),
                        latency_ms,
                        completion.usage.total_tokens()
                    );
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        succeeded: true,
                        error: None,
                        latency_ms,
                    });

                    let metadata = ExtractionMetadata {
                        provider: provider.name().to_string(),
                        model: provider.model().to_string(),
                        tokens_used: completion.usage.total_tokens(),
                        cost_usd: completion.usage.cost_usd,
                        latency_ms,
                        attempts,
                    };
                    let parsed = parse_response(&completion.text, context, metadata);
                    debug!(
                        "Normalized extraction: absence_request={}, confidence={:.2}, malformed={}",
                        parsed.is_absence_request,
                        parsed.confidence_score,
                        parsed.is_malformed()
                    );

                    return Ok(ExtractionReport {
                        parsed,
                        raw_text: completion.text,
                    });
                }
                Err(e) => {
                    warn!("Provider '{}' failed after {} ms: {}", provider.name(), latency_ms, e);
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        succeeded: false,
                        error: Some(e.to_string()),
                        latency_ms,
                    });
                }
            }
        }

        warn!("All {} extraction providers failed", attempts.len());
        Err(ExtractorError::ProviderUnavailable { attempts })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
