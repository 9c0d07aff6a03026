//! Request and response types of the pipeline service

use absentia_domain::{
    AbsenceRecord, AbsenceRecordId, AbsenceTypeId, EmployeeId, ParsedAbsenceRequest, ProcessingLogId,
};
use absentia_gatekeeper::{Candidate, HoldReason, RejectionReason, SkipReason};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record the gate would have created, returned when a candidate is held
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposedRecord {
    /// Matched employee
    pub employee_id: EmployeeId,
    /// Matched absence type
    pub absence_type_id: AbsenceTypeId,
    /// First day
    pub start_date: NaiveDate,
    /// Last day
    pub end_date: NaiveDate,
    /// Working days
    pub total_days: u32,
    /// Extraction confidence
    pub confidence: f64,
}

impl From<&Candidate> for ProposedRecord {
    fn from(candidate: &Candidate) -> Self {
        Self {
            employee_id: candidate.employee_id,
            absence_type_id: candidate.absence_type.id,
            start_date: candidate.range.start(),
            end_date: candidate.range.end(),
            total_days: candidate.total_days,
            confidence: candidate.confidence,
        }
    }
}

/// What a run decided
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A record was stored
    Created {
        /// The new record
        record_id: AbsenceRecordId,
    },
    /// Valid, but left for a human
    Held {
        /// What would have been created
        proposal: ProposedRecord,
        /// Why it was not
        reason: HoldReason,
    },
    /// Nothing to create
    Skipped {
        /// Why
        reason: SkipReason,
    },
    /// Business rule violated
    Rejected {
        /// Why
        reason: RejectionReason,
    },
    /// The provider answer could not be parsed
    Malformed {
        /// Parser message
        parse_error: Option<String>,
    },
    /// No provider answered
    Failed,
}

impl RunOutcome {
    /// Short label for tables and logs
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Created { .. } => "created",
            RunOutcome::Held { .. } => "held",
            RunOutcome::Skipped { .. } => "skipped",
            RunOutcome::Rejected { .. } => "rejected",
            RunOutcome::Malformed { .. } => "malformed",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Error categories reported to callers inside a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Every provider failed; the run is logged failed
    ProviderUnavailable,
    /// A business rule refused the request; the run is logged completed
    ValidationRejected,
}

/// Error detail attached to a response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunError {
    /// Category
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

/// Result of [`crate::AbsencePipeline::process_email`]
///
/// `success` means the pipeline ran to completion, whatever it decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEmailResponse {
    /// Pipeline ran to completion
    pub success: bool,
    /// Normalized extraction, absent when no provider answered
    pub parsed_request: Option<ParsedAbsenceRequest>,
    /// Record created by this run
    pub absence_record: Option<AbsenceRecord>,
    /// Audit entry of this run
    pub processing_log_id: ProcessingLogId,
    /// Wall time of the run
    pub processing_time_ms: u64,
    /// Whether a record was created
    pub auto_created: bool,
    /// Decision
    pub outcome: RunOutcome,
    /// Error detail for failed or rejected runs
    pub error: Option<RunError>,
}

/// Reviewer verdict on a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Whether the extraction was right
    pub is_correct: bool,
    /// Corrected fields, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrections: Option<Value>,
    /// Reviewer comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}
