//! Absence records and their approval lifecycle

use crate::absence_type::AbsenceType;
use crate::calendar::DateRange;
use crate::ids::{AbsenceRecordId, AbsenceTypeId, EmployeeId, ProcessingLogId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a record
///
/// ```text
/// pending ──► approved ──► cancelled
///    │
///    ├──────► rejected
///    └──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    /// Awaiting a decision
    Pending,
    /// Granted
    Approved,
    /// Refused
    Rejected,
    /// Withdrawn
    Cancelled,
}

impl AbsenceStatus {
    /// Statuses that never block another record from using the same days
    pub const NON_BLOCKING: [AbsenceStatus; 2] = [AbsenceStatus::Rejected, AbsenceStatus::Cancelled];

    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "pending",
            AbsenceStatus::Approved => "approved",
            AbsenceStatus::Rejected => "rejected",
            AbsenceStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(AbsenceStatus::Pending),
            "approved" => Some(AbsenceStatus::Approved),
            "rejected" => Some(AbsenceStatus::Rejected),
            "cancelled" | "canceled" => Some(AbsenceStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a record in this status occupies its days
    pub fn blocks_overlap(&self) -> bool {
        !Self::NON_BLOCKING.contains(self)
    }
}

impl std::str::FromStr for AbsenceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid absence status: {}", s))
    }
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordSource {
    /// Entered by a person
    #[serde(rename = "manual")]
    Manual,
    /// Created by the extraction pipeline
    #[serde(rename = "ai-extraction")]
    AiExtraction,
    /// Bulk import
    #[serde(rename = "import")]
    Import,
    /// External API client
    #[serde(rename = "api")]
    Api,
}

impl RecordSource {
    /// Get the source name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Manual => "manual",
            RecordSource::AiExtraction => "ai-extraction",
            RecordSource::Import => "import",
            RecordSource::Api => "api",
        }
    }

    /// Parse a source from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Some(RecordSource::Manual),
            "ai-extraction" | "ai_extraction" => Some(RecordSource::AiExtraction),
            "import" => Some(RecordSource::Import),
            "api" => Some(RecordSource::Api),
            _ => None,
        }
    }
}

/// An illegal status change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot move absence record from {from} to {to}")]
pub struct TransitionError {
    /// Current status
    pub from: &'static str,
    /// Requested status
    pub to: &'static str,
}

/// A concrete leave interval for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    /// Unique identifier
    pub id: AbsenceRecordId,

    /// Owning tenant
    pub tenant_id: TenantId,

    /// Employee on leave
    pub employee_id: EmployeeId,

    /// Kind of leave
    pub absence_type_id: AbsenceTypeId,

    /// First day of leave (inclusive)
    pub start_date: NaiveDate,

    /// Last day of leave (inclusive)
    pub end_date: NaiveDate,

    /// Working days covered, not calendar days
    pub total_days: u32,

    /// Stated reason
    pub reason: Option<String>,

    /// Reviewer or operator notes
    pub notes: Option<String>,

    /// Lifecycle status
    pub status: AbsenceStatus,

    /// Provenance
    pub source: RecordSource,

    /// Processing log entry when `source` is [`RecordSource::AiExtraction`]
    pub source_reference: Option<ProcessingLogId>,

    /// Extraction confidence, only for AI-created records
    pub confidence_score: Option<f64>,

    /// Who created the record
    pub created_by: String,

    /// Who approved the record
    pub approved_by: Option<String>,

    /// When the record was approved
    pub approved_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AbsenceRecord {
    /// Build a new record for `absence_type`, computing working days and the
    /// initial status from the type's approval flag
    pub fn new(
        tenant_id: TenantId,
        employee_id: EmployeeId,
        absence_type: &AbsenceType,
        range: DateRange,
        source: RecordSource,
        created_by: impl Into<String>,
    ) -> Self {
        let status = absence_type.initial_status();
        let now = Utc::now();
        let created_by = created_by.into();

        // Types without an approval step are approved by whoever created the record
        let (approved_by, approved_at) = if status == AbsenceStatus::Approved {
            (Some(created_by.clone()), Some(now))
        } else {
            (None, None)
        };

        Self {
            id: AbsenceRecordId::new(),
            tenant_id,
            employee_id,
            absence_type_id: absence_type.id,
            start_date: range.start(),
            end_date: range.end(),
            total_days: range.working_days(),
            reason: None,
            notes: None,
            status,
            source,
            source_reference: None,
            confidence_score: None,
            created_by,
            approved_by,
            approved_at,
            created_at: now,
        }
    }

    /// Attach the AI provenance: processing log reference and confidence
    pub fn with_extraction(mut self, log_id: ProcessingLogId, confidence: f64) -> Self {
        self.source = RecordSource::AiExtraction;
        self.source_reference = Some(log_id);
        self.confidence_score = Some(confidence);
        self
    }

    /// Set the stated reason
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Set notes
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// The record's days as a range
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
            .unwrap_or_else(|_| DateRange::single(self.start_date))
    }

    /// Approve a pending record
    pub fn approve(&mut self, approver: impl Into<String>, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.require_pending(AbsenceStatus::Approved)?;
        self.status = AbsenceStatus::Approved;
        self.approved_by = Some(approver.into());
        self.approved_at = Some(at);
        Ok(())
    }

    /// Reject a pending record
    pub fn reject(&mut self, notes: Option<String>) -> Result<(), TransitionError> {
        self.require_pending(AbsenceStatus::Rejected)?;
        self.status = AbsenceStatus::Rejected;
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Cancel a pending or approved record
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.status {
            AbsenceStatus::Pending | AbsenceStatus::Approved => {
                self.status = AbsenceStatus::Cancelled;
                Ok(())
            }
            other => Err(TransitionError {
                from: other.as_str(),
                to: AbsenceStatus::Cancelled.as_str(),
            }),
        }
    }

    fn require_pending(&self, to: AbsenceStatus) -> Result<(), TransitionError> {
        if self.status != AbsenceStatus::Pending {
            return Err(TransitionError {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        Ok(())
    }
}
