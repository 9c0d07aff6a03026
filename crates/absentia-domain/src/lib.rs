//! Absentia Domain Layer
//!
//! Core business model for the absence request decision pipeline. Everything
//! else in the workspace depends on the types and trait boundaries defined here.
//!
//! ## Key Concepts
//!
//! - **Employee**: a tenant-scoped person, referenced but never owned
//! - **AbsenceType**: tenant-defined leave category (sick, vacation, ...)
//! - **AbsenceRecord**: a concrete leave interval for one employee
//! - **ParsedAbsenceRequest**: the ephemeral result of extracting a request from free text
//! - **ProcessingLog**: the append-only audit entry of one pipeline run
//! - **Calendar rules**: working-day counting and closed-interval overlap
//!
//! ## Architecture
//!
//! - Pure business logic only, no I/O
//! - Storage lives in `absentia-store`, providers in `absentia-llm`
//! - Trait definitions for every collaborator the pipeline reads or writes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod absence_record;
pub mod absence_type;
pub mod calendar;
pub mod employee;
pub mod ids;
pub mod parsed_request;
pub mod processing_log;
pub mod traits;

// Re-exports for convenience
pub use absence_record::{AbsenceRecord, AbsenceStatus, RecordSource, TransitionError};
pub use absence_type::AbsenceType;
pub use calendar::{overlaps, working_days, DateRange, InvalidRange};
pub use employee::{Employee, EmployeeStatus};
pub use ids::{AbsenceRecordId, AbsenceTypeId, EmployeeId, ProcessingLogId, TenantId};
pub use parsed_request::{
    AbsenceTypeMatch, EmployeeMatch, ExtractionMetadata, MatchMethod, ParsedAbsenceRequest,
    ProviderAttempt,
};
pub use processing_log::{LogStateError, ProcessingLog, ProcessingStatus, RunSummary, EMAIL_PARSING};
