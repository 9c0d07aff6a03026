//! Scripted provider for tests and dry runs
//!
//! Returns queued outcomes in order, then falls back to a fixed outcome. No
//! network calls are made.

use crate::{ChatPrompt, Completion, ExtractionProvider, LlmError, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(String),
    Fail(String),
    Empty,
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<Scripted>,
    call_count: usize,
    last_prompt: Option<ChatPrompt>,
}

/// Mock extraction provider
///
/// Clones share the same queue and call count.
///
/// # Examples
///
/// ```
/// use absentia_llm::{ChatPrompt, ExtractionProvider, MockProvider};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let provider = MockProvider::failing("primary", "connection refused");
/// let prompt = ChatPrompt::new("s", "u");
/// assert!(provider.extract(&prompt, Duration::from_secs(1)).await.is_err());
/// assert_eq!(provider.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    model: String,
    fallback: Scripted,
    usage: Usage,
    delay: Duration,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Provider that always answers `response`
    pub fn new(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self::with_fallback(name.into(), Scripted::Respond(response.into()))
    }

    /// Provider that always fails with a communication error
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_fallback(name.into(), Scripted::Fail(message.into()))
    }

    /// Provider that always answers with no content
    pub fn empty(name: impl Into<String>) -> Self {
        Self::with_fallback(name.into(), Scripted::Empty)
    }

    fn with_fallback(name: String, fallback: Scripted) -> Self {
        Self {
            name,
            model: "mock-model".to_string(),
            fallback,
            usage: Usage::default(),
            delay: Duration::ZERO,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the model id reported in metadata
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Report this usage on every successful call
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32, cost_usd: f64) -> Self {
        self.usage = Usage {
            prompt_tokens,
            completion_tokens,
            cost_usd,
        };
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a response for the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().queue.push_back(Scripted::Respond(response.into()));
    }

    /// Queue a failure for the next unanswered call
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state().queue.push_back(Scripted::Fail(message.into()));
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.state().call_count
    }

    /// Prompt of the most recent call
    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.state().last_prompt.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the script from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExtractionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn extract(&self, prompt: &ChatPrompt, deadline: Duration) -> Result<Completion, LlmError> {
        let scripted = {
            let mut state = self.state();
            state.call_count += 1;
            state.last_prompt = Some(prompt.clone());
            state.queue.pop_front().unwrap_or_else(|| self.fallback.clone())
        };

        if !self.delay.is_zero() {
            if self.delay > deadline {
                tokio::time::sleep(deadline).await;
                return Err(LlmError::Timeout(deadline.as_millis() as u64));
            }
            tokio::time::sleep(self.delay).await;
        }

        match scripted {
            Scripted::Respond(text) => Ok(Completion { text, usage: self.usage }),
            Scripted::Fail(message) => Err(LlmError::Communication(message)),
            Scripted::Empty => Err(LlmError::EmptyContent),
        }
    }
}
