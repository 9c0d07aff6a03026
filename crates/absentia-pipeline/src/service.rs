//! The pipeline service: one email in, one decision and one audit entry out

use crate::redact::redact_email;
use crate::{
    ErrorKind, Feedback, PipelineConfig, PipelineError, ProcessEmailResponse, ProcessingStats, ProposedRecord,
    RunError, RunOutcome,
};
use absentia_domain::traits::{
    AbsenceRecordStore, AbsenceTypeCatalog, EmployeeDirectory, ProcessingLogStore, RemovalOutcome,
};
use absentia_domain::{
    AbsenceRecord, AbsenceRecordId, AbsenceTypeId, ParsedAbsenceRequest, ProcessingLog, ProcessingLogId,
    ProviderAttempt, RunSummary, TenantId, EMAIL_PARSING,
};
use absentia_extractor::{EmailMessage, ExtractionOrchestrator, ExtractionReport, ExtractorError, RequestContext};
use absentia_gatekeeper::{DecisionGate, Evaluation, Materialized, Provenance};
use absentia_store::SqliteStore;
use chrono::Utc;
use serde_json::json;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Absence request decision pipeline
///
/// Generic over a store implementing every collaborator trait with one error
/// type. The store sits behind a mutex that is never held across an await, so
/// runs for different emails may proceed concurrently; the store's atomic
/// insert keeps their records from overlapping.
pub struct AbsencePipeline<S> {
    store: Arc<Mutex<S>>,
    orchestrator: ExtractionOrchestrator,
    gate: DecisionGate,
    config: PipelineConfig,
}

impl AbsencePipeline<SqliteStore> {
    /// Open the configured database and build providers and gate
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let store = SqliteStore::new(&config.database_path).map_err(PipelineError::store)?;
        let orchestrator = ExtractionOrchestrator::from_config(config.extractor.clone())?;
        let gate = DecisionGate::new(config.gate.clone())?;
        Ok(Self::new(Arc::new(Mutex::new(store)), orchestrator, gate, config))
    }

    /// Open the configured database without building any provider
    ///
    /// Enough for statistics, feedback and record reviews. Emails processed
    /// through such a pipeline fail with no provider available.
    pub fn open_for_review(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let store = SqliteStore::new(&config.database_path).map_err(PipelineError::store)?;
        let orchestrator = ExtractionOrchestrator::new(Vec::new(), config.extractor.clone());
        let gate = DecisionGate::new(config.gate.clone())?;
        Ok(Self::new(Arc::new(Mutex::new(store)), orchestrator, gate, config))
    }
}

impl<S, E> AbsencePipeline<S>
where
    S: EmployeeDirectory<Error = E>
        + AbsenceTypeCatalog<Error = E>
        + AbsenceRecordStore<Error = E>
        + ProcessingLogStore<Error = E>,
    E: Display,
{
    /// Assemble a pipeline from its parts
    pub fn new(
        store: Arc<Mutex<S>>,
        orchestrator: ExtractionOrchestrator,
        gate: DecisionGate,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            gate,
            config,
        }
    }

    /// Shared handle to the store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> Result<T, PipelineError> {
        let mut store = self.store.lock().map_err(|_| PipelineError::LockPoisoned)?;
        Ok(f(&mut store))
    }

    fn write_log(&self, log: &ProcessingLog) -> Result<(), PipelineError> {
        self.with_store(|s| s.update_log(log))?.map_err(PipelineError::store)
    }

    /// Turn one email into a decision
    ///
    /// Provider outages, unparseable answers and rule violations come back
    /// inside the response. `Err` means the store failed or the roster could
    /// not be loaded.
    pub async fn process_email(
        &self,
        tenant_id: TenantId,
        email: &EmailMessage,
        auto_create: bool,
    ) -> Result<ProcessEmailResponse, PipelineError> {
        let started = Instant::now();

        let mut log = ProcessingLog::start(
            tenant_id,
            EMAIL_PARSING,
            redact_email(email, self.config.log_excerpt_chars),
        );
        self.with_store(|s| s.insert_log(&log))?
            .map_err(PipelineError::store)?;
        info!("Run {} started for tenant {}", log.id, tenant_id);

        let max_entries = self.orchestrator.config().max_context_entries;
        let context = match self.with_store(|s| RequestContext::load(&*s, &*s, tenant_id, max_entries))? {
            Ok(context) => context,
            Err(e) => {
                self.abandon(&mut log, &e, started);
                return Err(e.into());
            }
        };

        // No lock is held while providers are called
        let report = match self.orchestrator.extract(&context, email).await {
            Ok(report) => report,
            Err(ExtractorError::ProviderUnavailable { attempts }) => {
                return self.provider_unavailable(log, attempts, started);
            }
            Err(e) => {
                self.abandon(&mut log, &e, started);
                return Err(e.into());
            }
        };

        let parsed = report.parsed.clone();
        debug!(
            "Run {}: absence request = {}, confidence {:.2}",
            log.id, parsed.is_absence_request, parsed.confidence_score
        );

        if parsed.is_malformed() {
            let parse_error = parsed.parse_error.clone();
            let outcome = RunOutcome::Malformed { parse_error };
            log.complete(self.summary(&report, &outcome, started))?;
            self.write_log(&log)?;
            warn!("Run {}: provider answer could not be parsed", log.id);
            return Ok(self.respond(&log, Some(parsed), None, outcome, None, started));
        }

        let provenance = Provenance {
            tenant_id,
            log_id: log.id,
            created_by: &self.config.created_by,
        };
        let evaluation = self.with_store(|s| self.gate.evaluate(&parsed, auto_create, provenance, &*s))??;

        let record = match evaluation {
            Evaluation::Skipped(reason) => {
                let outcome = RunOutcome::Skipped { reason };
                return self.close_completed(log, &report, outcome, None, started);
            }
            Evaluation::Held { candidate, reason } => {
                let outcome = RunOutcome::Held {
                    proposal: ProposedRecord::from(&candidate),
                    reason,
                };
                return self.close_completed(log, &report, outcome, None, started);
            }
            Evaluation::Rejected { reason, .. } => {
                let error = RunError {
                    kind: ErrorKind::ValidationRejected,
                    message: reason.to_string(),
                };
                let outcome = RunOutcome::Rejected { reason };
                return self.close_completed(log, &report, outcome, Some(error), started);
            }
            Evaluation::Create(record) => record,
        };

        // The completed entry is durable before the insert is attempted
        let proposed_id = record.id;
        let pending = RunOutcome::Created { record_id: proposed_id };
        log.complete(self.summary(&report, &pending, started))?;
        self.write_log(&log)?;

        match self.with_store(|s| self.gate.materialize(record, s))?? {
            Materialized::Created(record) => {
                log.link_record(record.id)?;
                log.note_materialization(json!({ "decision": "created", "record_id": record.id }), None)?;
                self.write_log(&log)?;
                info!("Run {} created absence record {}", log.id, record.id);
                Ok(self.respond(
                    &log,
                    Some(parsed),
                    Some(record.clone()),
                    RunOutcome::Created { record_id: record.id },
                    None,
                    started,
                ))
            }
            Materialized::Rejected(reason) => {
                warn!("Run {}: record lost an overlap race: {}", log.id, reason);
                let outcome = RunOutcome::Rejected { reason: reason.clone() };
                log.note_materialization(
                    json!({
                        "decision": "rejected",
                        "proposed_record_id": proposed_id,
                        "reason": reason,
                    }),
                    Some(json!(outcome)),
                )?;
                self.write_log(&log)?;
                let error = RunError {
                    kind: ErrorKind::ValidationRejected,
                    message: reason.to_string(),
                };
                Ok(self.respond(
                    &log,
                    Some(parsed),
                    None,
                    outcome,
                    Some(error),
                    started,
                ))
            }
        }
    }

    fn summary(&self, report: &ExtractionReport, outcome: &RunOutcome, started: Instant) -> RunSummary {
        let metadata = &report.parsed.metadata;
        RunSummary {
            provider: Some(metadata.provider.clone()),
            ai_response: Some(json!({
                "raw": report.raw_text,
                "normalized": report.parsed,
                "outcome": outcome,
            })),
            confidence_score: Some(report.parsed.confidence_score),
            tokens_used: metadata.tokens_used,
            cost_usd: metadata.cost_usd,
            processing_time_ms: elapsed_ms(started),
        }
    }

    fn close_completed(
        &self,
        mut log: ProcessingLog,
        report: &ExtractionReport,
        outcome: RunOutcome,
        error: Option<RunError>,
        started: Instant,
    ) -> Result<ProcessEmailResponse, PipelineError> {
        log.complete(self.summary(report, &outcome, started))?;
        self.write_log(&log)?;
        info!("Run {} completed: {}", log.id, outcome.label());
        Ok(self.respond(&log, Some(report.parsed.clone()), None, outcome, error, started))
    }

    fn provider_unavailable(
        &self,
        mut log: ProcessingLog,
        attempts: Vec<ProviderAttempt>,
        started: Instant,
    ) -> Result<ProcessEmailResponse, PipelineError> {
        let message = ExtractorError::ProviderUnavailable {
            attempts: attempts.clone(),
        }
        .to_string();
        let summary = RunSummary {
            provider: attempts.last().map(|a| a.provider.clone()),
            ai_response: Some(json!({ "attempts": attempts })),
            processing_time_ms: elapsed_ms(started),
            ..RunSummary::default()
        };
        log.fail(message.clone(), summary)?;
        self.write_log(&log)?;
        error!("Run {} failed: {}", log.id, message);

        let error = RunError {
            kind: ErrorKind::ProviderUnavailable,
            message,
        };
        Ok(self.respond(&log, None, None, RunOutcome::Failed, Some(error), started))
    }

    /// Best-effort close of a run that is about to return `Err`
    fn abandon(&self, log: &mut ProcessingLog, cause: &dyn Display, started: Instant) {
        let summary = RunSummary {
            processing_time_ms: elapsed_ms(started),
            ..RunSummary::default()
        };
        if log.fail(cause.to_string(), summary).is_ok() {
            if let Err(e) = self.write_log(log) {
                warn!("Could not close run {}: {}", log.id, e);
            }
        }
        error!("Run {} aborted: {}", log.id, cause);
    }

    fn respond(
        &self,
        log: &ProcessingLog,
        parsed_request: Option<ParsedAbsenceRequest>,
        absence_record: Option<AbsenceRecord>,
        outcome: RunOutcome,
        error: Option<RunError>,
        started: Instant,
    ) -> ProcessEmailResponse {
        ProcessEmailResponse {
            success: !matches!(outcome, RunOutcome::Failed),
            auto_created: absence_record.is_some(),
            parsed_request,
            absence_record,
            processing_log_id: log.id,
            processing_time_ms: elapsed_ms(started),
            outcome,
            error,
        }
    }

    /// Aggregate figures over every run of a tenant
    pub fn processing_stats(&self, tenant_id: TenantId) -> Result<ProcessingStats, PipelineError> {
        let logs = self
            .with_store(|s| s.logs_for_tenant(tenant_id))?
            .map_err(PipelineError::store)?;
        Ok(ProcessingStats::from_logs(&logs))
    }

    /// Append reviewer feedback to a closed run
    pub fn submit_feedback(&self, log_id: ProcessingLogId, feedback: Feedback) -> Result<ProcessingLog, PipelineError> {
        let mut log = self
            .with_store(|s| s.get_log(log_id))?
            .map_err(PipelineError::store)?
            .ok_or(PipelineError::LogNotFound(log_id))?;

        log.append_feedback(json!({
            "is_correct": feedback.is_correct,
            "corrections": feedback.corrections,
            "comments": feedback.comments,
            "submitted_at": Utc::now().to_rfc3339(),
        }))?;
        self.write_log(&log)?;
        info!("Feedback recorded on run {} (correct: {})", log_id, feedback.is_correct);
        Ok(log)
    }

    /// Get a run's audit entry
    pub fn processing_log(&self, log_id: ProcessingLogId) -> Result<ProcessingLog, PipelineError> {
        self.with_store(|s| s.get_log(log_id))?
            .map_err(PipelineError::store)?
            .ok_or(PipelineError::LogNotFound(log_id))
    }

    fn change_record(
        &self,
        id: AbsenceRecordId,
        transition: impl FnOnce(&mut AbsenceRecord) -> Result<(), absentia_domain::TransitionError>,
    ) -> Result<AbsenceRecord, PipelineError> {
        self.with_store(|s| -> Result<AbsenceRecord, PipelineError> {
            let mut record = s
                .get_record(id)
                .map_err(PipelineError::store)?
                .ok_or(PipelineError::RecordNotFound(id))?;
            transition(&mut record)?;
            s.update_record_status(&record).map_err(PipelineError::store)?;
            Ok(record)
        })?
    }

    /// Approve a pending record
    pub fn approve_record(&self, id: AbsenceRecordId, approver: &str) -> Result<AbsenceRecord, PipelineError> {
        let record = self.change_record(id, |r| r.approve(approver, Utc::now()))?;
        info!("Record {} approved by {}", id, approver);
        Ok(record)
    }

    /// Reject a pending record
    pub fn reject_record(
        &self,
        id: AbsenceRecordId,
        reviewer: &str,
        notes: Option<&str>,
    ) -> Result<AbsenceRecord, PipelineError> {
        let notes = match notes {
            Some(notes) => format!("Rejected by {}: {}", reviewer, notes),
            None => format!("Rejected by {}", reviewer),
        };
        let record = self.change_record(id, |r| r.reject(Some(notes)))?;
        info!("Record {} rejected by {}", id, reviewer);
        Ok(record)
    }

    /// Cancel a pending or approved record, freeing its days
    pub fn cancel_record(&self, id: AbsenceRecordId) -> Result<AbsenceRecord, PipelineError> {
        let record = self.change_record(id, |r| r.cancel())?;
        info!("Record {} cancelled", id);
        Ok(record)
    }

    /// All records of a tenant
    pub fn records(&self, tenant_id: TenantId) -> Result<Vec<AbsenceRecord>, PipelineError> {
        self.with_store(|s| s.records_for_tenant(tenant_id))?
            .map_err(PipelineError::store)
    }

    /// Delete an absence type, or deactivate it when records reference it
    pub fn remove_absence_type(&self, id: AbsenceTypeId) -> Result<RemovalOutcome, PipelineError> {
        let outcome = self
            .with_store(|s| s.remove_absence_type(id))?
            .map_err(PipelineError::store)?;
        info!("Absence type {} removal: {:?}", id, outcome);
        Ok(outcome)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
