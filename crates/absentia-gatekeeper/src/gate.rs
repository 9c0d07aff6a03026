//! Decision gate: turn a parsed request into a skip, a rejection, a hold or a
//! new record

use crate::{GateConfig, GatekeeperError};
use absentia_domain::traits::{AbsenceRecordStore, AbsenceTypeCatalog, CreateOutcome};
use absentia_domain::{
    AbsenceRecord, AbsenceRecordId, AbsenceStatus, AbsenceType, AbsenceTypeId, DateRange, EmployeeId,
    ParsedAbsenceRequest, ProcessingLogId, RecordSource, TenantId,
};
use serde::Serialize;
use std::fmt::{self, Display};
use tracing::{debug, info};

/// Why nothing was attempted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The text does not ask for an absence
    NotAbsenceRequest,
    /// No trusted employee match
    MissingEmployee,
    /// No trusted absence type match
    MissingAbsenceType,
    /// Start or end date absent
    MissingDates,
    /// Start after end
    InvalidDateRange {
        /// Extracted start
        start: String,
        /// Extracted end
        end: String,
    },
    /// The matched type is gone from the catalog
    UnknownAbsenceType {
        /// Matched id
        id: AbsenceTypeId,
    },
    /// The matched type was deactivated
    InactiveAbsenceType {
        /// Matched id
        id: AbsenceTypeId,
    },
    /// The range is longer than the configured limit
    SpanTooLong {
        /// Calendar days requested
        days: u32,
        /// Configured limit
        max: u32,
    },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAbsenceRequest => write!(f, "not an absence request"),
            SkipReason::MissingEmployee => write!(f, "no matching employee"),
            SkipReason::MissingAbsenceType => write!(f, "no matching absence type"),
            SkipReason::MissingDates => write!(f, "start or end date missing"),
            SkipReason::InvalidDateRange { start, end } => write!(f, "start {} is after end {}", start, end),
            SkipReason::UnknownAbsenceType { id } => write!(f, "absence type {} not found", id),
            SkipReason::InactiveAbsenceType { id } => write!(f, "absence type {} is inactive", id),
            SkipReason::SpanTooLong { days, max } => write!(f, "{} calendar days exceeds limit of {}", days, max),
        }
    }
}

/// Why a valid candidate was not created
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoldReason {
    /// Confidence under the threshold
    BelowThreshold {
        /// Extracted confidence
        confidence: f64,
        /// Configured threshold
        threshold: f64,
    },
    /// The caller asked not to create records
    AutoCreateDisabled,
}

impl Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::BelowThreshold { confidence, threshold } => {
                write!(f, "confidence {:.2} below threshold {:.2}", confidence, threshold)
            }
            HoldReason::AutoCreateDisabled => write!(f, "auto-create disabled"),
        }
    }
}

/// Business-rule violation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Pending or approved leave already covers some of the days
    Overlap {
        /// Records in the way
        conflicting: Vec<AbsenceRecordId>,
    },
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Overlap { conflicting } => {
                let ids: Vec<String> = conflicting.iter().map(ToString::to_string).collect();
                write!(f, "overlaps existing absence records: {}", ids.join(", "))
            }
        }
    }
}

/// A request that passed the structural checks
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Matched employee
    pub employee_id: EmployeeId,
    /// Matched type as stored in the catalog
    pub absence_type: AbsenceType,
    /// Requested days
    pub range: DateRange,
    /// Working days in the range
    pub total_days: u32,
    /// Extraction confidence
    pub confidence: f64,
    /// Stated reason
    pub reason: Option<String>,
}

/// Result of the structural checks
#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    /// Nothing to do
    Skipped(SkipReason),
    /// Worth checking against existing leave
    Candidate(Candidate),
}

/// Final decision before any write
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Nothing to do
    Skipped(SkipReason),
    /// Business rule violated
    Rejected {
        /// The candidate that was refused
        candidate: Candidate,
        /// Why
        reason: RejectionReason,
    },
    /// Valid but left for a human
    Held {
        /// Proposed record data
        candidate: Candidate,
        /// Why it was not created
        reason: HoldReason,
    },
    /// Ready to insert
    Create(AbsenceRecord),
}

/// Result of the insert attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    /// Record stored
    Created(AbsenceRecord),
    /// A concurrent insert won; nothing stored
    Rejected(RejectionReason),
}

/// Who creates records and how they link back to a run
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Log of the run producing the record
    pub log_id: ProcessingLogId,
    /// `created_by` value
    pub created_by: &'a str,
}

/// The decision gate
pub struct DecisionGate {
    config: GateConfig,
}

impl DecisionGate {
    /// Create a gate, validating the configuration
    pub fn new(config: GateConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self { config })
    }

    /// Create a gate with the default configuration
    pub fn default_config() -> Self {
        Self {
            config: GateConfig::default(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Structural checks: is there an employee, a live type and a valid range?
    pub fn assess<C>(
        &self,
        parsed: &ParsedAbsenceRequest,
        tenant_id: TenantId,
        catalog: &C,
    ) -> Result<Assessment, GatekeeperError>
    where
        C: AbsenceTypeCatalog,
        C::Error: Display,
    {
        if !parsed.is_absence_request {
            return Ok(Assessment::Skipped(SkipReason::NotAbsenceRequest));
        }
        let Some(employee) = &parsed.employee else {
            return Ok(Assessment::Skipped(SkipReason::MissingEmployee));
        };
        let Some(type_match) = &parsed.absence_type else {
            return Ok(Assessment::Skipped(SkipReason::MissingAbsenceType));
        };
        let (Some(start), Some(end)) = (parsed.start_date, parsed.end_date) else {
            return Ok(Assessment::Skipped(SkipReason::MissingDates));
        };
        let Ok(range) = DateRange::new(start, end) else {
            return Ok(Assessment::Skipped(SkipReason::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            }));
        };

        if let Some(max) = self.config.max_span_days {
            let days = range.calendar_days();
            if days > max {
                return Ok(Assessment::Skipped(SkipReason::SpanTooLong { days, max }));
            }
        }

        let absence_type = catalog
            .absence_type(type_match.id)
            .map_err(|e| GatekeeperError::Store(e.to_string()))?
            .filter(|t| t.tenant_id == tenant_id);
        let absence_type = match absence_type {
            Some(t) if t.is_active || !self.config.require_active_type => t,
            Some(_) => {
                return Ok(Assessment::Skipped(SkipReason::InactiveAbsenceType { id: type_match.id }));
            }
            None => {
                return Ok(Assessment::Skipped(SkipReason::UnknownAbsenceType { id: type_match.id }));
            }
        };

        Ok(Assessment::Candidate(Candidate {
            employee_id: employee.id,
            absence_type,
            range,
            total_days: range.working_days(),
            confidence: parsed.confidence_score,
            reason: parsed.reason.clone(),
        }))
    }

    /// Overlap check against the employee's pending and approved records
    pub fn check_collisions<S>(
        &self,
        candidate: &Candidate,
        store: &S,
    ) -> Result<Option<RejectionReason>, GatekeeperError>
    where
        S: AbsenceRecordStore,
        S::Error: Display,
    {
        let conflicting = store
            .find_overlapping(candidate.employee_id, candidate.range, &AbsenceStatus::NON_BLOCKING)
            .map_err(|e| GatekeeperError::Store(e.to_string()))?;

        if conflicting.is_empty() {
            Ok(None)
        } else {
            debug!(
                "Candidate for employee {} overlaps {} records",
                candidate.employee_id,
                conflicting.len()
            );
            Ok(Some(RejectionReason::Overlap {
                conflicting: conflicting.iter().map(|r| r.id).collect(),
            }))
        }
    }

    /// Whether a clean candidate must wait for a human
    pub fn hold_reason(&self, candidate: &Candidate, auto_create: bool) -> Option<HoldReason> {
        if candidate.confidence < self.config.confidence_threshold {
            Some(HoldReason::BelowThreshold {
                confidence: candidate.confidence,
                threshold: self.config.confidence_threshold,
            })
        } else if !auto_create {
            Some(HoldReason::AutoCreateDisabled)
        } else {
            None
        }
    }

    /// The record an accepted candidate becomes
    pub fn build_record(&self, candidate: &Candidate, provenance: Provenance<'_>) -> AbsenceRecord {
        AbsenceRecord::new(
            provenance.tenant_id,
            candidate.employee_id,
            &candidate.absence_type,
            candidate.range,
            RecordSource::AiExtraction,
            provenance.created_by,
        )
        .with_extraction(provenance.log_id, candidate.confidence)
        .with_reason(candidate.reason.clone())
    }

    /// Run every check and decide, without writing anything
    pub fn evaluate<S>(
        &self,
        parsed: &ParsedAbsenceRequest,
        auto_create: bool,
        provenance: Provenance<'_>,
        store: &S,
    ) -> Result<Evaluation, GatekeeperError>
    where
        S: AbsenceTypeCatalog + AbsenceRecordStore,
        <S as AbsenceTypeCatalog>::Error: Display,
        <S as AbsenceRecordStore>::Error: Display,
    {
        let candidate = match self.assess(parsed, provenance.tenant_id, store)? {
            Assessment::Skipped(reason) => {
                debug!("Gate skipped request: {}", reason);
                return Ok(Evaluation::Skipped(reason));
            }
            Assessment::Candidate(candidate) => candidate,
        };

        if let Some(reason) = self.check_collisions(&candidate, store)? {
            info!("Gate rejected request: {}", reason);
            return Ok(Evaluation::Rejected { candidate, reason });
        }

        if let Some(reason) = self.hold_reason(&candidate, auto_create) {
            info!("Gate held request: {}", reason);
            return Ok(Evaluation::Held { candidate, reason });
        }

        Ok(Evaluation::Create(self.build_record(&candidate, provenance)))
    }

    /// Insert the record; the store re-checks overlaps atomically
    pub fn materialize<S>(&self, record: AbsenceRecord, store: &mut S) -> Result<Materialized, GatekeeperError>
    where
        S: AbsenceRecordStore,
        S::Error: Display,
    {
        match store
            .create_record(&record)
            .map_err(|e| GatekeeperError::Store(e.to_string()))?
        {
            CreateOutcome::Created(id) => {
                info!("Created absence record {} ({} working days)", id, record.total_days);
                Ok(Materialized::Created(record))
            }
            CreateOutcome::Conflict(conflicting) => {
                info!("Record {} lost an overlap race", record.id);
                Ok(Materialized::Rejected(RejectionReason::Overlap {
                    conflicting: conflicting.iter().map(|r| r.id).collect(),
                }))
            }
        }
    }
}

