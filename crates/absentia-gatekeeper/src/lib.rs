//! Absentia Gatekeeper
//!
//! Decides what happens to a parsed absence request.
//!
//! The gate provides:
//! - Structural checks (employee, live absence type, ordered dates)
//! - Working-day computation
//! - Overlap detection against pending and approved leave
//! - The confidence threshold for automatic creation
//!
//! Evaluation never writes. [`DecisionGate::materialize`] performs the insert,
//! and the store repeats the overlap check atomically so a concurrent run
//! cannot slip in between.
//!
//! # Examples
//!
//! ```
//! use absentia_gatekeeper::{DecisionGate, GateConfig};
//!
//! let gate = DecisionGate::new(GateConfig::strict()).unwrap();
//! assert_eq!(gate.config().confidence_threshold, 0.9);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;

pub use config::{GateConfig, DEFAULT_CONFIDENCE_THRESHOLD};
pub use error::GatekeeperError;
pub use gate::{
    Assessment, Candidate, DecisionGate, Evaluation, HoldReason, Materialized, Provenance, RejectionReason,
    SkipReason,
};
