//! Absentia Extractor
//!
//! Turns a free-text email into a `ParsedAbsenceRequest` using one or more
//! extraction providers with fallback.
//!
//! # Architecture
//!
//! ```text
//! Email + RequestContext → PromptBuilder → provider A → (provider B on failure)
//!     → first JSON object → normalize against context → ParsedAbsenceRequest
//! ```
//!
//! # Key Features
//!
//! - **Closed roster**: providers may only reference employees and absence
//!   types from the `RequestContext`; anything else is discarded
//! - **Strict fallback**: providers are tried in priority order, each with its
//!   own deadline, under an overall run budget
//! - **Garbage tolerance**: unparseable answers become a zero-confidence
//!   negative result instead of a failure
//!
//! # Example Usage
//!
//! ```
//! use absentia_extractor::{EmailMessage, ExtractionOrchestrator, ExtractorConfig, RequestContext};
//! use absentia_llm::{ExtractionProvider, MockProvider};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let primary: Arc<dyn ExtractionProvider> = Arc::new(MockProvider::failing("primary", "down"));
//! let fallback: Arc<dyn ExtractionProvider> =
//!     Arc::new(MockProvider::new("fallback", r#"{"is_absence_request": false}"#));
//! let orchestrator = ExtractionOrchestrator::new(vec![primary, fallback], ExtractorConfig::default());
//!
//! let email = EmailMessage::new("Lunch?", "Pizza on Friday?", "bob@example.com");
//! let report = orchestrator.extract(&RequestContext::default(), &email).await.unwrap();
//! assert_eq!(report.parsed.metadata.provider, "fallback");
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod orchestrator;
mod parser;
mod prompt;
mod types;


pub use config::ExtractorConfig;
pub use context::{keywords_for, AbsenceTypeEntry, EmployeeEntry, RequestContext};
pub use error::ExtractorError;
pub use orchestrator::ExtractionOrchestrator;
pub use parser::{first_json_object, parse_date, parse_response};
pub use prompt::{truncate_chars, PromptBuilder};
pub use types::{EmailMessage, ExtractionReport};
