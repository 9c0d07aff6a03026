//! Integration tests for absentia-store
//!
//! These tests cover the roster and taxonomy reads, the overlap-guarded record
//! insert and the processing log lifecycle.

use absentia_domain::traits::{
    AbsenceRecordStore, AbsenceTypeCatalog, CreateOutcome, EmployeeDirectory, ProcessingLogStore,
    RemovalOutcome,
};
use absentia_domain::{
    AbsenceRecord, AbsenceStatus, AbsenceType, DateRange, Employee, EmployeeStatus, ProcessingLog,
    ProcessingStatus, RecordSource, RunSummary, TenantId, EMAIL_PARSING,
};
use absentia_store::SqliteStore;
use chrono::{NaiveDate, Utc};
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

struct Fixture {
    store: SqliteStore,
    tenant: TenantId,
    employee: Employee,
    sick: AbsenceType,
}

fn fixture() -> Fixture {
    let mut store = SqliteStore::in_memory().unwrap();
    let tenant = TenantId::new();
    let employee = Employee::new(tenant, "Ada", "Lovelace").with_email("ada@example.com");
    let sick = AbsenceType::new(tenant, "Sick Leave", "SICK").with_requires_approval(false);
    store.upsert_employee(&employee).unwrap();
    store.upsert_absence_type(&sick).unwrap();
    Fixture { store, tenant, employee, sick }
}

fn sick_record(f: &Fixture, start: NaiveDate, end: NaiveDate) -> AbsenceRecord {
    AbsenceRecord::new(f.tenant, f.employee.id, &f.sick, range(start, end), RecordSource::Manual, "tests")
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_roster_is_tenant_scoped() {
    let mut f = fixture();
    let other_tenant = TenantId::new();
    let stranger = Employee::new(other_tenant, "Grace", "Hopper");
    f.store.upsert_employee(&stranger).unwrap();

    let employees = f.store.employees(f.tenant).unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0], f.employee);

    let others = f.store.employees(other_tenant).unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].first_name, "Grace");
}

#[test]
fn test_upsert_employee_updates_status() {
    let mut f = fixture();
    let mut updated = f.employee.clone();
    updated.status = EmployeeStatus::Terminated;
    f.store.upsert_employee(&updated).unwrap();

    let employees = f.store.employees(f.tenant).unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].status, EmployeeStatus::Terminated);
}

#[test]
fn test_absence_type_round_trip() {
    let f = fixture();
    let loaded = f.store.absence_type(f.sick.id).unwrap().expect("type should exist");
    assert_eq!(loaded, f.sick);
    assert!(!loaded.requires_approval);

    let all = f.store.absence_types(f.tenant).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_duplicate_type_code_rejected() {
    let mut f = fixture();
    let clash = AbsenceType::new(f.tenant, "Sick (dup)", "SICK");
    assert!(f.store.upsert_absence_type(&clash).is_err(), "Codes are unique per tenant");

    let elsewhere = AbsenceType::new(TenantId::new(), "Sick", "SICK");
    assert!(f.store.upsert_absence_type(&elsewhere).is_ok());
}

#[test]
fn test_create_and_get_record() {
    let mut f = fixture();
    let record = sick_record(&f, date(2024, 1, 15), date(2024, 1, 17));

    let outcome = f.store.create_record(&record).unwrap();
    assert_eq!(outcome, CreateOutcome::Created(record.id));

    let loaded = f.store.get_record(record.id).unwrap().expect("record should exist");
    assert_eq!(loaded.start_date, date(2024, 1, 15));
    assert_eq!(loaded.end_date, date(2024, 1, 17));
    assert_eq!(loaded.total_days, 3);
    assert_eq!(loaded.status, AbsenceStatus::Approved);
    assert_eq!(loaded.approved_by.as_deref(), Some("tests"));
    assert_eq!(loaded.source, RecordSource::Manual);
}

#[test]
fn test_overlapping_record_is_conflict() {
    let mut f = fixture();
    let first = sick_record(&f, date(2024, 1, 15), date(2024, 1, 17));
    f.store.create_record(&first).unwrap();

    let second = sick_record(&f, date(2024, 1, 17), date(2024, 1, 19));
    match f.store.create_record(&second).unwrap() {
        CreateOutcome::Conflict(conflicts) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].id, first.id);
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    assert!(f.store.get_record(second.id).unwrap().is_none(), "Conflicting record must not be stored");
    assert_eq!(f.store.records_for_tenant(f.tenant).unwrap().len(), 1);
}

#[test]
fn test_adjacent_ranges_do_not_conflict() {
    let mut f = fixture();
    f.store.create_record(&sick_record(&f, date(2024, 1, 15), date(2024, 1, 17))).unwrap();

    let next = sick_record(&f, date(2024, 1, 18), date(2024, 1, 19));
    assert_eq!(f.store.create_record(&next).unwrap(), CreateOutcome::Created(next.id));
}

#[test]
fn test_other_employee_does_not_conflict() {
    let mut f = fixture();
    f.store.create_record(&sick_record(&f, date(2024, 1, 15), date(2024, 1, 17))).unwrap();

    let colleague = Employee::new(f.tenant, "Charles", "Babbage");
    f.store.upsert_employee(&colleague).unwrap();
    let theirs = AbsenceRecord::new(
        f.tenant,
        colleague.id,
        &f.sick,
        range(date(2024, 1, 15), date(2024, 1, 17)),
        RecordSource::Manual,
        "tests",
    );
    assert_eq!(f.store.create_record(&theirs).unwrap(), CreateOutcome::Created(theirs.id));
}

#[test]
fn test_cancelled_record_frees_the_days() {
    let mut f = fixture();
    let mut first = sick_record(&f, date(2024, 1, 15), date(2024, 1, 17));
    f.store.create_record(&first).unwrap();

    first.cancel().unwrap();
    f.store.update_record_status(&first).unwrap();

    let overlapping = f
        .store
        .find_overlapping(f.employee.id, range(date(2024, 1, 16), date(2024, 1, 16)), &AbsenceStatus::NON_BLOCKING)
        .unwrap();
    assert!(overlapping.is_empty());

    let replacement = sick_record(&f, date(2024, 1, 16), date(2024, 1, 18));
    assert_eq!(f.store.create_record(&replacement).unwrap(), CreateOutcome::Created(replacement.id));
}

#[test]
fn test_find_overlapping_respects_exclusions() {
    let mut f = fixture();
    let mut rejected = AbsenceRecord::new(
        f.tenant,
        f.employee.id,
        &f.sick.clone().with_requires_approval(true),
        range(date(2024, 3, 4), date(2024, 3, 8)),
        RecordSource::Manual,
        "tests",
    );
    f.store.create_record(&rejected).unwrap();
    rejected.reject(Some("not covered".to_string())).unwrap();
    f.store.update_record_status(&rejected).unwrap();

    let probe = range(date(2024, 3, 6), date(2024, 3, 6));
    assert_eq!(f.store.find_overlapping(f.employee.id, probe, &[]).unwrap().len(), 1);
    assert!(f
        .store
        .find_overlapping(f.employee.id, probe, &AbsenceStatus::NON_BLOCKING)
        .unwrap()
        .is_empty());

    let loaded = f.store.get_record(rejected.id).unwrap().unwrap();
    assert_eq!(loaded.status, AbsenceStatus::Rejected);
    assert_eq!(loaded.notes.as_deref(), Some("not covered"));
}

#[test]
fn test_approve_persists_approver() {
    let mut f = fixture();
    let vacation = AbsenceType::new(f.tenant, "Vacation", "VAC");
    f.store.upsert_absence_type(&vacation).unwrap();

    let mut record = AbsenceRecord::new(
        f.tenant,
        f.employee.id,
        &vacation,
        range(date(2024, 7, 1), date(2024, 7, 5)),
        RecordSource::Manual,
        "tests",
    );
    f.store.create_record(&record).unwrap();
    assert_eq!(f.store.get_record(record.id).unwrap().unwrap().status, AbsenceStatus::Pending);

    record.approve("manager", Utc::now()).unwrap();
    f.store.update_record_status(&record).unwrap();

    let loaded = f.store.get_record(record.id).unwrap().unwrap();
    assert_eq!(loaded.status, AbsenceStatus::Approved);
    assert_eq!(loaded.approved_by.as_deref(), Some("manager"));
    assert!(loaded.approved_at.is_some());
}

#[test]
fn test_update_missing_record_is_not_found() {
    let mut f = fixture();
    let record = sick_record(&f, date(2024, 1, 15), date(2024, 1, 15));
    assert!(f.store.update_record_status(&record).is_err());
}

#[test]
fn test_trigger_blocks_overlap_from_second_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absentia.db");

    let mut store = SqliteStore::new(&path).unwrap();
    let tenant = TenantId::new();
    let employee = Employee::new(tenant, "Ada", "Lovelace");
    let sick = AbsenceType::new(tenant, "Sick Leave", "SICK").with_requires_approval(false);
    store.upsert_employee(&employee).unwrap();
    store.upsert_absence_type(&sick).unwrap();

    let first = AbsenceRecord::new(
        tenant,
        employee.id,
        &sick,
        range(date(2024, 1, 15), date(2024, 1, 17)),
        RecordSource::Manual,
        "tests",
    );
    store.create_record(&first).unwrap();

    // A raw insert that skips the application-level check still hits the trigger
    let raw = rusqlite::Connection::open(&path).unwrap();
    let result = raw.execute(
        "INSERT INTO absence_records (id, tenant_id, employee_id, absence_type_id, start_date, end_date,
                                      total_days, status, source, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, '2024-01-16', '2024-01-18', 3, 'pending', 'manual', 'raw', '2024-01-01T00:00:00Z')",
        rusqlite::params![
            uuid::Uuid::now_v7(),
            tenant.as_uuid(),
            employee.id.as_uuid(),
            sick.id.as_uuid(),
        ],
    );
    let err = result.expect_err("Trigger should reject the overlapping insert");
    assert!(err.to_string().contains("absence_overlap"), "unexpected error: {}", err);

    // A second store on the same file sees the first record as a conflict
    let mut second = SqliteStore::new(&path).unwrap();
    let competing = AbsenceRecord::new(
        tenant,
        employee.id,
        &sick,
        range(date(2024, 1, 17), date(2024, 1, 17)),
        RecordSource::Manual,
        "tests",
    );
    assert!(matches!(second.create_record(&competing).unwrap(), CreateOutcome::Conflict(_)));
}

#[test]
fn test_remove_unreferenced_type_deletes_it() {
    let mut f = fixture();
    let unused = AbsenceType::new(f.tenant, "Jury Duty", "JURY");
    f.store.upsert_absence_type(&unused).unwrap();

    assert_eq!(f.store.remove_absence_type(unused.id).unwrap(), RemovalOutcome::Deleted);
    assert!(f.store.absence_type(unused.id).unwrap().is_none());
}

#[test]
fn test_remove_referenced_type_deactivates_it() {
    let mut f = fixture();
    let record = sick_record(&f, date(2024, 2, 5), date(2024, 2, 5));
    f.store.create_record(&record).unwrap();

    assert_eq!(f.store.remove_absence_type(f.sick.id).unwrap(), RemovalOutcome::Deactivated);

    let loaded = f.store.absence_type(f.sick.id).unwrap().expect("type should survive");
    assert!(!loaded.is_active);
    assert!(f.store.get_record(record.id).unwrap().is_some(), "Records keep their type");
}

#[test]
fn test_remove_unknown_type_is_not_found() {
    let mut f = fixture();
    let ghost = AbsenceType::new(f.tenant, "Ghost", "GHOST");
    assert_eq!(f.store.remove_absence_type(ghost.id).unwrap(), RemovalOutcome::NotFound);
}

#[test]
fn test_processing_log_lifecycle() {
    let mut f = fixture();
    let mut log = ProcessingLog::start(f.tenant, EMAIL_PARSING, json!({ "subject": "Sick today" }));
    f.store.insert_log(&log).unwrap();

    let opened = f.store.get_log(log.id).unwrap().unwrap();
    assert_eq!(opened.status, ProcessingStatus::Processing);
    assert_eq!(opened.input_data["subject"], "Sick today");

    log.complete(RunSummary {
        provider: Some("openai".to_string()),
        ai_response: Some(json!({ "is_absence_request": true })),
        confidence_score: Some(0.92),
        tokens_used: 420,
        cost_usd: 0.0031,
        processing_time_ms: 812,
    })
    .unwrap();
    f.store.update_log(&log).unwrap();

    let record = sick_record(&f, date(2024, 1, 15), date(2024, 1, 15));
    f.store.create_record(&record).unwrap();
    log.link_record(record.id).unwrap();
    log.append_feedback(json!({ "is_correct": true })).unwrap();
    f.store.update_log(&log).unwrap();

    let closed = f.store.get_log(log.id).unwrap().unwrap();
    assert_eq!(closed.status, ProcessingStatus::Completed);
    assert_eq!(closed.provider.as_deref(), Some("openai"));
    assert_eq!(closed.confidence_score, Some(0.92));
    assert_eq!(closed.tokens_used, 420);
    assert_eq!(closed.processing_time_ms, 812);
    assert_eq!(closed.related_record_id, Some(record.id));
    assert!(closed.completed_at.is_some());
    assert_eq!(closed.feedback().len(), 1);
}

#[test]
fn test_logs_for_tenant_oldest_first() {
    let mut f = fixture();
    let first = ProcessingLog::start(f.tenant, EMAIL_PARSING, json!({}));
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = ProcessingLog::start(f.tenant, EMAIL_PARSING, json!({}));
    f.store.insert_log(&second).unwrap();
    f.store.insert_log(&first).unwrap();
    f.store.insert_log(&ProcessingLog::start(TenantId::new(), EMAIL_PARSING, json!({}))).unwrap();

    let logs = f.store.logs_for_tenant(f.tenant).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].id, first.id);
    assert_eq!(logs[1].id, second.id);
}

#[test]
fn test_update_unknown_log_is_not_found() {
    let mut f = fixture();
    let log = ProcessingLog::start(f.tenant, EMAIL_PARSING, json!({}));
    assert!(f.store.update_log(&log).is_err());
}
