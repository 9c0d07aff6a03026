//! Absentia Extraction Provider Layer
//!
//! Pluggable chat-completion providers that turn a prompt into raw text.
//!
//! # Architecture
//!
//! Every backend implements the async [`ExtractionProvider`] trait. The
//! orchestrator in `absentia-extractor` holds them as
//! `Vec<Arc<dyn ExtractionProvider>>` in priority order and never needs to
//! know which transport sits behind a name.
//!
//! # Providers
//!
//! - `OpenAiProvider`: OpenAI-compatible `/chat/completions`
//! - `AnthropicProvider`: Anthropic `/v1/messages`
//! - `MockProvider`: scripted responses for tests
//!
//! # Examples
//!
//! ```
//! use absentia_llm::{ChatPrompt, ExtractionProvider, MockProvider};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("mock", r#"{"is_absence_request": false}"#);
//! let prompt = ChatPrompt::new("system", "user");
//! let completion = provider.extract(&prompt, Duration::from_secs(1)).await.unwrap();
//! assert!(completion.text.contains("is_absence_request"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod config;
pub mod error;
pub mod mock;
pub mod openai;
pub mod pricing;
mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use anthropic::AnthropicProvider;
pub use config::{build_provider, ProviderKind, ProviderSettings};
pub use error::LlmError;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use pricing::TokenPricing;

/// System instruction plus user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPrompt {
    /// Fixed instruction and output schema
    pub system: String,
    /// Request-specific content
    pub user: String,
}

impl ChatPrompt {
    /// Create a prompt
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Token usage and cost of one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens sent
    pub prompt_tokens: u32,
    /// Tokens generated
    pub completion_tokens: u32,
    /// Cost in USD from the provider's pricing
    pub cost_usd: f64,
}

impl Usage {
    /// Total tokens billed
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens as u64 + self.completion_tokens as u64
    }
}

/// Raw answer of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Text content of the first choice
    pub text: String,
    /// Usage and cost
    pub usage: Usage,
}

/// A chat-completion backend
///
/// Implementations must give up once `deadline` has elapsed; callers also
/// wrap each call in their own timeout.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Name used in logs and metadata
    fn name(&self) -> &str;

    /// Model id sent to the backend
    fn model(&self) -> &str;

    /// Send the prompt and return the raw text
    async fn extract(&self, prompt: &ChatPrompt, deadline: Duration) -> Result<Completion, LlmError>;
}
