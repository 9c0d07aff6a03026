//! Absentia Pipeline
//!
//! Wires the store, the extraction orchestrator and the decision gate into
//! one service.
//!
//! # Architecture
//!
//! ```text
//! email ─► processing log (processing)
//!       ─► RequestContext::load ─► ExtractionOrchestrator::extract
//!       ─► DecisionGate::evaluate ─► processing log (completed | failed)
//!       ─► DecisionGate::materialize ─► link record to log
//! ```
//!
//! Every run leaves exactly one processing log entry. It is closed before the
//! record insert is attempted, so a failed insert still leaves a completed,
//! auditable entry without a linked record.
//!
//! # Example Usage
//!
//! ```
//! use absentia_pipeline::{AbsencePipeline, PipelineConfig};
//! use absentia_extractor::{EmailMessage, ExtractionOrchestrator, ExtractorConfig};
//! use absentia_gatekeeper::DecisionGate;
//! use absentia_llm::{ExtractionProvider, MockProvider};
//! use absentia_domain::TenantId;
//! use absentia_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider: Arc<dyn ExtractionProvider> =
//!     Arc::new(MockProvider::new("mock", r#"{"is_absence_request": false, "confidence_score": 0.9}"#));
//! let pipeline = AbsencePipeline::new(
//!     Arc::new(Mutex::new(SqliteStore::in_memory().unwrap())),
//!     ExtractionOrchestrator::new(vec![provider], ExtractorConfig::default()),
//!     DecisionGate::default_config(),
//!     PipelineConfig::default(),
//! );
//!
//! let email = EmailMessage::new("Lunch", "Pizza on Friday?", "bob@example.com");
//! let response = pipeline.process_email(TenantId::new(), &email, true).await.unwrap();
//! assert!(response.success);
//! assert!(!response.auto_created);
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod redact;
mod service;
mod stats;
mod types;

pub use config::{PipelineConfig, DEFAULT_CREATED_BY};
pub use error::{ConfigError, PipelineError};
pub use redact::{input_digest, redact_email};
pub use service::AbsencePipeline;
pub use stats::ProcessingStats;
pub use types::{ErrorKind, Feedback, ProcessEmailResponse, ProposedRecord, RunError, RunOutcome};
