//! End-to-end pipeline tests: mock providers, in-memory SQLite store

use absentia_domain::traits::{
    AbsenceRecordStore, AbsenceTypeCatalog, CreateOutcome, EmployeeDirectory, ProcessingLogStore, RemovalOutcome,
};
use absentia_domain::{
    AbsenceRecord, AbsenceRecordId, AbsenceStatus, AbsenceType, AbsenceTypeId, DateRange, Employee, EmployeeId,
    ProcessingLog, ProcessingLogId, ProcessingStatus, RecordSource, TenantId,
};
use absentia_extractor::{EmailMessage, ExtractionOrchestrator, ExtractorConfig};
use absentia_gatekeeper::{DecisionGate, HoldReason, RejectionReason, SkipReason};
use absentia_llm::{ExtractionProvider, MockProvider};
use absentia_pipeline::{
    AbsencePipeline, ErrorKind, Feedback, PipelineConfig, PipelineError, RunOutcome,
};
use absentia_store::{SqliteStore, StoreError};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Roster {
    tenant: TenantId,
    employee: Employee,
    sick: AbsenceType,
    vacation: AbsenceType,
}

fn seeded_store() -> (SqliteStore, Roster) {
    let mut store = SqliteStore::in_memory().unwrap();
    let tenant = TenantId::new();
    let employee = Employee::new(tenant, "Ada", "Lovelace").with_email("ada@example.com");
    let sick = AbsenceType::new(tenant, "Sick Leave", "SICK").with_requires_approval(false);
    let vacation = AbsenceType::new(tenant, "Annual Leave", "AL");
    store.upsert_employee(&employee).unwrap();
    store.upsert_absence_type(&sick).unwrap();
    store.upsert_absence_type(&vacation).unwrap();
    (
        store,
        Roster {
            tenant,
            employee,
            sick,
            vacation,
        },
    )
}

fn answer(employee: EmployeeId, absence_type: AbsenceTypeId, start: &str, end: &str, confidence: f64) -> String {
    json!({
        "is_absence_request": true,
        "confidence_score": confidence,
        "employee": { "id": employee.to_string(), "match_method": "email" },
        "absence_type": { "id": absence_type.to_string(), "matched_keywords": ["sick"] },
        "start_date": start,
        "end_date": end,
        "reason": "flu",
    })
    .to_string()
}

fn pipeline_with<S>(store: S, providers: Vec<MockProvider>) -> AbsencePipeline<S>
where
    S: EmployeeDirectory<Error = StoreError>
        + AbsenceTypeCatalog<Error = StoreError>
        + AbsenceRecordStore<Error = StoreError>
        + ProcessingLogStore<Error = StoreError>,
{
    let providers: Vec<Arc<dyn ExtractionProvider>> = providers
        .into_iter()
        .map(|p| Arc::new(p) as Arc<dyn ExtractionProvider>)
        .collect();
    AbsencePipeline::new(
        Arc::new(Mutex::new(store)),
        ExtractionOrchestrator::new(providers, ExtractorConfig::default()),
        DecisionGate::default_config(),
        PipelineConfig::default(),
    )
}

fn email() -> EmailMessage {
    EmailMessage::new(
        "Sick today",
        "Hi, I'm down with the flu and won't make it in Monday to Wednesday. Ada",
        "ada@example.com",
    )
}

#[tokio::test]
async fn test_high_confidence_creates_record() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    )
    .with_usage(400, 100, 0.002);
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.success);
    assert!(response.auto_created);
    assert!(response.error.is_none());
    let record = response.absence_record.clone().unwrap();
    assert_eq!(response.outcome, RunOutcome::Created { record_id: record.id });
    assert_eq!(record.source, RecordSource::AiExtraction);
    assert_eq!(record.status, AbsenceStatus::Approved);
    assert_eq!(record.total_days, 3);
    assert_eq!(record.source_reference, Some(response.processing_log_id));
    assert_eq!(record.confidence_score, Some(0.95));
    assert_eq!(record.created_by, "absence-pipeline");

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Completed);
    assert_eq!(log.related_record_id, Some(record.id));
    assert_eq!(log.provider.as_deref(), Some("primary"));
    assert_eq!(log.confidence_score, Some(0.95));
    assert_eq!(log.tokens_used, 500);
    let ai_response = log.ai_response.as_ref().unwrap();
    assert_eq!(ai_response["outcome"]["decision"], "created");
    assert_eq!(ai_response["materialization"]["decision"], "created");
    assert_eq!(ai_response["materialization"]["record_id"], record.id.to_string());

    let stored = pipeline.records(roster.tenant).unwrap();
    assert_eq!(stored, vec![record]);
}

#[tokio::test]
async fn test_reported_parse_error_key_still_creates_record() {
    let (store, roster) = seeded_store();
    let mut fields: serde_json::Value = serde_json::from_str(&answer(
        roster.employee.id,
        roster.sick.id,
        "2024-01-15",
        "2024-01-17",
        0.95,
    ))
    .unwrap();
    fields["extracted_data"] = json!({ "parse_error": "none" });
    let pipeline = pipeline_with(store, vec![MockProvider::new("primary", fields.to_string())]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.auto_created);
    assert!(matches!(response.outcome, RunOutcome::Created { .. }));
    let parsed = response.parsed_request.unwrap();
    assert!(parsed.parse_error.is_none());
    assert_eq!(parsed.extracted_data["provider"]["parse_error"], "none");
}

#[tokio::test]
async fn test_approval_type_creates_pending_record() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.vacation.id, "2024-07-01", "2024-07-05", 0.9),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    let record = response.absence_record.unwrap();
    assert_eq!(record.status, AbsenceStatus::Pending);
    assert_eq!(record.total_days, 5);
}

#[tokio::test]
async fn test_low_confidence_is_held() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.5),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.success);
    assert!(!response.auto_created);
    assert!(response.absence_record.is_none());
    assert_eq!(response.parsed_request.as_ref().unwrap().confidence_score, 0.5);
    match &response.outcome {
        RunOutcome::Held { proposal, reason } => {
            assert_eq!(proposal.employee_id, roster.employee.id);
            assert_eq!(proposal.total_days, 3);
            assert_eq!(
                *reason,
                HoldReason::BelowThreshold {
                    confidence: 0.5,
                    threshold: 0.8
                }
            );
        }
        other => panic!("expected Held, got {:?}", other),
    }

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Completed);
    assert!(log.related_record_id.is_none());
    assert!(pipeline.records(roster.tenant).unwrap().is_empty());
}

#[tokio::test]
async fn test_auto_create_disabled_is_held() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.99),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), false).await.unwrap();

    assert!(!response.auto_created);
    assert!(matches!(
        response.outcome,
        RunOutcome::Held {
            reason: HoldReason::AutoCreateDisabled,
            ..
        }
    ));
}

#[tokio::test]
async fn test_overlap_is_validation_rejected() {
    let (mut store, roster) = seeded_store();
    let mut existing = AbsenceRecord::new(
        roster.tenant,
        roster.employee.id,
        &roster.vacation,
        DateRange::new(date(2024, 1, 15), date(2024, 1, 17)).unwrap(),
        RecordSource::Manual,
        "hr",
    );
    existing.approve("hr", Utc::now()).unwrap();
    assert_eq!(store.create_record(&existing).unwrap(), CreateOutcome::Created(existing.id));

    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-16", "2024-01-16", 0.95),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.success);
    assert!(!response.auto_created);
    assert_eq!(
        response.outcome,
        RunOutcome::Rejected {
            reason: RejectionReason::Overlap {
                conflicting: vec![existing.id]
            }
        }
    );
    assert_eq!(response.error.as_ref().unwrap().kind, ErrorKind::ValidationRejected);
    assert_eq!(pipeline.records(roster.tenant).unwrap().len(), 1);

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_fallback_provider_is_recorded() {
    let (store, roster) = seeded_store();
    let primary = MockProvider::failing("primary", "connection refused");
    let fallback = MockProvider::new(
        "fallback",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    );
    let pipeline = pipeline_with(store, vec![primary, fallback]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    let parsed = response.parsed_request.unwrap();
    assert_eq!(parsed.metadata.provider, "fallback");
    assert_eq!(parsed.metadata.attempts.len(), 2);
    assert!(!parsed.metadata.attempts[0].succeeded);
    assert!(response.auto_created);

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.provider.as_deref(), Some("fallback"));
}

#[tokio::test]
async fn test_all_providers_failing() {
    let (store, roster) = seeded_store();
    let pipeline = pipeline_with(
        store,
        vec![
            MockProvider::failing("primary", "HTTP 503"),
            MockProvider::failing("fallback", "HTTP 500"),
        ],
    );

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(!response.success);
    assert!(!response.auto_created);
    assert!(response.parsed_request.is_none());
    assert!(response.absence_record.is_none());
    assert_eq!(response.outcome, RunOutcome::Failed);
    assert_eq!(response.error.as_ref().unwrap().kind, ErrorKind::ProviderUnavailable);

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Failed);
    assert!(log.error_message.is_some());
    assert!(log.completed_at.is_some());
    assert_eq!(log.ai_response.as_ref().unwrap()["attempts"].as_array().unwrap().len(), 2);
    assert!(pipeline.records(roster.tenant).unwrap().is_empty());
}

#[tokio::test]
async fn test_unparseable_answer_is_negative() {
    let (store, roster) = seeded_store();
    let pipeline = pipeline_with(store, vec![MockProvider::new("primary", "Sorry, I can't help with that.")]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.success);
    assert!(response.error.is_none());
    let parsed = response.parsed_request.unwrap();
    assert!(!parsed.is_absence_request);
    assert_eq!(parsed.confidence_score, 0.0);
    assert!(matches!(response.outcome, RunOutcome::Malformed { parse_error: Some(_) }));

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Completed);
    assert_eq!(log.confidence_score, Some(0.0));
}

#[tokio::test]
async fn test_not_an_absence_request_is_skipped() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new("primary", r#"{"is_absence_request": false, "confidence_score": 0.97}"#);
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(response.success);
    assert_eq!(
        response.outcome,
        RunOutcome::Skipped {
            reason: SkipReason::NotAbsenceRequest
        }
    );
}

#[tokio::test]
async fn test_unknown_employee_is_discarded() {
    let (store, roster) = seeded_store();
    let stranger = EmployeeId::new();
    let provider = MockProvider::new(
        "primary",
        answer(stranger, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert_eq!(
        response.outcome,
        RunOutcome::Skipped {
            reason: SkipReason::MissingEmployee
        }
    );
    let parsed = response.parsed_request.unwrap();
    assert!(parsed.employee.is_none());
    assert_eq!(parsed.extracted_data["rejected_employee_id"], stranger.to_string());
}

#[tokio::test]
async fn test_other_tenant_roster_is_not_offered() {
    let (mut store, roster) = seeded_store();
    let other_tenant = TenantId::new();
    let outsider = Employee::new(other_tenant, "Grace", "Hopper");
    store.upsert_employee(&outsider).unwrap();

    let provider = MockProvider::new(
        "primary",
        answer(outsider.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    );
    let probe = provider.clone();
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(!response.auto_created);
    let prompt = probe.last_prompt().unwrap();
    assert!(prompt.user.contains(&roster.employee.id.to_string()));
    assert!(!prompt.user.contains(&outsider.id.to_string()));
}

#[tokio::test]
async fn test_log_input_is_redacted() {
    let (store, roster) = seeded_store();
    let mut config = PipelineConfig::default();
    config.log_excerpt_chars = 12;
    let provider: Arc<dyn ExtractionProvider> =
        Arc::new(MockProvider::new("primary", r#"{"is_absence_request": false}"#));
    let pipeline = AbsencePipeline::new(
        Arc::new(Mutex::new(store)),
        ExtractionOrchestrator::new(vec![provider], ExtractorConfig::default()),
        DecisionGate::default_config(),
        config,
    );

    let message = email();
    let response = pipeline.process_email(roster.tenant, &message, true).await.unwrap();
    let log = pipeline.processing_log(response.processing_log_id).unwrap();

    assert_eq!(log.input_data["subject"], "Sick today");
    assert_eq!(log.input_data["sender"], "ada@example.com");
    assert_eq!(log.input_data["body_excerpt"], "Hi, I'm down");
    assert_eq!(log.input_data["body_chars"], message.body.chars().count());
    assert_eq!(log.input_data["input_digest"], absentia_pipeline::input_digest(&message));
}

#[tokio::test]
async fn test_processing_stats() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.9),
    )
    .with_usage(100, 50, 0.01);
    provider.push_response(answer(roster.employee.id, roster.sick.id, "2024-02-05", "2024-02-05", 0.5));
    provider.push_failure("HTTP 503");
    let pipeline = pipeline_with(store, vec![provider]);

    for _ in 0..3 {
        pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    }

    let stats = pipeline.processing_stats(roster.tenant).unwrap();
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.successful_processed, 2);
    assert_eq!(stats.failed_processed, 1);
    assert_eq!(stats.auto_created_records, 1);
    assert!((stats.avg_confidence_score - 0.7).abs() < 1e-9);
    assert!((stats.auto_creation_rate - 100.0 / 3.0).abs() < 1e-9);

    let empty = pipeline.processing_stats(TenantId::new()).unwrap();
    assert_eq!(empty.total_processed, 0);
    assert_eq!(empty.success_rate, 0.0);
}

#[tokio::test]
async fn test_feedback_is_appended() {
    let (store, roster) = seeded_store();
    let pipeline = pipeline_with(store, vec![MockProvider::new("primary", r#"{"is_absence_request": false}"#)]);
    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    pipeline
        .submit_feedback(
            response.processing_log_id,
            Feedback {
                is_correct: false,
                corrections: Some(json!({ "is_absence_request": true })),
                comments: Some("this was a sick note".to_string()),
            },
        )
        .unwrap();
    pipeline
        .submit_feedback(
            response.processing_log_id,
            Feedback {
                is_correct: true,
                ..Feedback::default()
            },
        )
        .unwrap();

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    let feedback = log.feedback();
    assert_eq!(feedback.len(), 2);
    assert_eq!(feedback[0]["is_correct"], false);
    assert_eq!(feedback[0]["comments"], "this was a sick note");
    assert_eq!(feedback[1]["is_correct"], true);
    // The redacted input is still there
    assert_eq!(log.input_data["subject"], "Sick today");
}

#[tokio::test]
async fn test_feedback_for_unknown_log() {
    let (store, _) = seeded_store();
    let pipeline = pipeline_with(store, vec![MockProvider::new("primary", "{}")]);

    let err = pipeline
        .submit_feedback(ProcessingLogId::new(), Feedback::default())
        .unwrap_err();
    assert!(matches!(err, PipelineError::LogNotFound(_)));
}

#[tokio::test]
async fn test_record_lifecycle() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.vacation.id, "2024-07-01", "2024-07-05", 0.9),
    );
    provider.push_response(answer(roster.employee.id, roster.vacation.id, "2024-07-01", "2024-07-05", 0.9));
    provider.push_response(answer(roster.employee.id, roster.vacation.id, "2024-07-01", "2024-07-05", 0.9));
    let pipeline = pipeline_with(store, vec![provider]);

    let first = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    let record_id = first.absence_record.unwrap().id;

    let approved = pipeline.approve_record(record_id, "manager@example.com").unwrap();
    assert_eq!(approved.status, AbsenceStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("manager@example.com"));

    let err = pipeline.reject_record(record_id, "manager@example.com", None).unwrap_err();
    assert!(matches!(err, PipelineError::Transition(_)));

    // Same days again while approved
    let second = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    assert!(matches!(second.outcome, RunOutcome::Rejected { .. }));

    let cancelled = pipeline.cancel_record(record_id).unwrap();
    assert_eq!(cancelled.status, AbsenceStatus::Cancelled);

    // Cancelled leave no longer blocks the days
    let third = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    assert!(third.auto_created);
}

#[tokio::test]
async fn test_reject_pending_record() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.vacation.id, "2024-07-01", "2024-07-05", 0.9),
    );
    let pipeline = pipeline_with(store, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    let record_id = response.absence_record.unwrap().id;

    let rejected = pipeline
        .reject_record(record_id, "manager@example.com", Some("team offsite that week"))
        .unwrap();
    assert_eq!(rejected.status, AbsenceStatus::Rejected);
    assert_eq!(
        rejected.notes.as_deref(),
        Some("Rejected by manager@example.com: team offsite that week")
    );

    let err = pipeline.approve_record(AbsenceRecordId::new(), "manager@example.com").unwrap_err();
    assert!(matches!(err, PipelineError::RecordNotFound(_)));
}

#[tokio::test]
async fn test_remove_absence_type() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    );
    provider.push_response(answer(roster.employee.id, roster.sick.id, "2024-03-04", "2024-03-04", 0.95));
    let pipeline = pipeline_with(store, vec![provider]);

    pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert_eq!(pipeline.remove_absence_type(roster.sick.id).unwrap(), RemovalOutcome::Deactivated);
    assert_eq!(pipeline.remove_absence_type(roster.vacation.id).unwrap(), RemovalOutcome::Deleted);
    assert_eq!(pipeline.remove_absence_type(AbsenceTypeId::new()).unwrap(), RemovalOutcome::NotFound);

    // Deactivated types drop out of the roster the provider may reference
    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();
    assert_eq!(
        response.outcome,
        RunOutcome::Skipped {
            reason: SkipReason::MissingAbsenceType
        }
    );
}

#[tokio::test]
async fn test_concurrent_runs_create_one_record() {
    let (store, roster) = seeded_store();
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    )
    .with_delay(Duration::from_millis(20));
    let pipeline = pipeline_with(store, vec![provider]);

    let first_email = email();
    let second_email = email();
    let (a, b) = tokio::join!(
        pipeline.process_email(roster.tenant, &first_email, true),
        pipeline.process_email(roster.tenant, &second_email, true),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!([a.auto_created, b.auto_created].iter().filter(|c| **c).count(), 1);
    let loser = if a.auto_created { &b } else { &a };
    assert!(matches!(loser.outcome, RunOutcome::Rejected { .. }));
    assert_eq!(pipeline.records(roster.tenant).unwrap().len(), 1);
}

#[test]
fn test_from_config_rejects_invalid_gate() {
    let mut config = PipelineConfig::default();
    config.gate.confidence_threshold = 2.0;
    assert!(matches!(
        AbsencePipeline::<SqliteStore>::from_config(config),
        Err(PipelineError::Config(_))
    ));
}

#[tokio::test]
async fn test_from_config_opens_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.database_path = dir.path().join("absentia.db");
    for provider in &mut config.extractor.providers {
        provider.api_key = Some("test-key".to_string());
    }

    let pipeline = AbsencePipeline::<SqliteStore>::from_config(config.clone()).unwrap();
    assert!(config.database_path.exists());
    assert_eq!(pipeline.processing_stats(TenantId::new()).unwrap().total_processed, 0);
}

#[tokio::test]
async fn test_review_pipeline_has_no_providers() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.database_path = dir.path().join("absentia.db");
    // Provider keys are never resolved
    for provider in &mut config.extractor.providers {
        provider.api_key = None;
        provider.api_key_env = Some("ABSENTIA_TEST_UNSET_KEY".to_string());
    }

    let pipeline = AbsencePipeline::<SqliteStore>::open_for_review(config).unwrap();
    let tenant = TenantId::new();
    let response = pipeline.process_email(tenant, &email(), true).await.unwrap();

    assert!(!response.success);
    assert_eq!(response.error.unwrap().kind, ErrorKind::ProviderUnavailable);
    assert_eq!(pipeline.processing_stats(tenant).unwrap().failed_processed, 1);
}

/// A store where another writer slips a conflicting record in right before
/// the pipeline's insert
struct RacingStore {
    inner: SqliteStore,
    intruder: Option<AbsenceRecord>,
}

impl EmployeeDirectory for RacingStore {
    type Error = StoreError;

    fn employees(&self, tenant_id: TenantId) -> Result<Vec<Employee>, StoreError> {
        self.inner.employees(tenant_id)
    }
}

impl AbsenceTypeCatalog for RacingStore {
    type Error = StoreError;

    fn absence_types(&self, tenant_id: TenantId) -> Result<Vec<AbsenceType>, StoreError> {
        self.inner.absence_types(tenant_id)
    }

    fn absence_type(&self, id: AbsenceTypeId) -> Result<Option<AbsenceType>, StoreError> {
        self.inner.absence_type(id)
    }

    fn remove_absence_type(&mut self, id: AbsenceTypeId) -> Result<RemovalOutcome, StoreError> {
        self.inner.remove_absence_type(id)
    }
}

impl AbsenceRecordStore for RacingStore {
    type Error = StoreError;

    fn create_record(&mut self, record: &AbsenceRecord) -> Result<CreateOutcome, StoreError> {
        if let Some(intruder) = self.intruder.take() {
            self.inner.create_record(&intruder)?;
        }
        self.inner.create_record(record)
    }

    fn find_overlapping(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
        exclude_statuses: &[AbsenceStatus],
    ) -> Result<Vec<AbsenceRecord>, StoreError> {
        self.inner.find_overlapping(employee_id, range, exclude_statuses)
    }

    fn get_record(&self, id: AbsenceRecordId) -> Result<Option<AbsenceRecord>, StoreError> {
        self.inner.get_record(id)
    }

    fn update_record_status(&mut self, record: &AbsenceRecord) -> Result<(), StoreError> {
        self.inner.update_record_status(record)
    }

    fn records_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AbsenceRecord>, StoreError> {
        self.inner.records_for_tenant(tenant_id)
    }
}

impl ProcessingLogStore for RacingStore {
    type Error = StoreError;

    fn insert_log(&mut self, log: &ProcessingLog) -> Result<(), StoreError> {
        self.inner.insert_log(log)
    }

    fn update_log(&mut self, log: &ProcessingLog) -> Result<(), StoreError> {
        self.inner.update_log(log)
    }

    fn get_log(&self, id: ProcessingLogId) -> Result<Option<ProcessingLog>, StoreError> {
        self.inner.get_log(id)
    }

    fn logs_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<ProcessingLog>, StoreError> {
        self.inner.logs_for_tenant(tenant_id)
    }
}

#[tokio::test]
async fn test_lost_race_leaves_completed_log_without_record() {
    let (store, roster) = seeded_store();
    let intruder = AbsenceRecord::new(
        roster.tenant,
        roster.employee.id,
        &roster.vacation,
        DateRange::single(date(2024, 1, 16)),
        RecordSource::Manual,
        "hr",
    );
    let racing = RacingStore {
        inner: store,
        intruder: Some(intruder.clone()),
    };
    let provider = MockProvider::new(
        "primary",
        answer(roster.employee.id, roster.sick.id, "2024-01-15", "2024-01-17", 0.95),
    );
    let pipeline = pipeline_with(racing, vec![provider]);

    let response = pipeline.process_email(roster.tenant, &email(), true).await.unwrap();

    assert!(!response.auto_created);
    assert_eq!(
        response.outcome,
        RunOutcome::Rejected {
            reason: RejectionReason::Overlap {
                conflicting: vec![intruder.id]
            }
        }
    );
    assert_eq!(response.error.unwrap().kind, ErrorKind::ValidationRejected);

    let log = pipeline.processing_log(response.processing_log_id).unwrap();
    assert_eq!(log.status, ProcessingStatus::Completed);
    assert!(log.related_record_id.is_none());
    let ai_response = log.ai_response.as_ref().unwrap();
    assert_eq!(ai_response["outcome"]["decision"], "rejected");
    assert_eq!(ai_response["outcome"]["reason"]["kind"], "overlap");
    assert_eq!(ai_response["materialization"]["decision"], "rejected");
    assert_eq!(
        ai_response["materialization"]["reason"]["conflicting"][0],
        intruder.id.to_string()
    );
    assert!(ai_response["materialization"]["proposed_record_id"].is_string());
    assert_eq!(pipeline.records(roster.tenant).unwrap(), vec![intruder]);
}
