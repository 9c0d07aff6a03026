//! Absentia Storage Layer
//!
//! Implements every collaborator trait from `absentia-domain::traits` on top of
//! a single SQLite database.
//!
//! # Architecture
//!
//! - SQLite for employees, absence types, absence records and processing logs
//! - Overlap exclusion enforced twice: inside the `create_record` transaction
//!   and by a `BEFORE INSERT` trigger, so a second connection cannot slip an
//!   overlapping record in between
//! - Referenced absence types are deactivated instead of deleted
//!
//! # Examples
//!
//! ```no_run
//! use absentia_store::SqliteStore;
//!
//! let store = SqliteStore::new("absentia.db").unwrap();
//! // Store is now ready for pipeline operations
//! ```

#![warn(missing_docs)]

use absentia_domain::traits::{
    AbsenceRecordStore, AbsenceTypeCatalog, CreateOutcome, EmployeeDirectory, ProcessingLogStore,
    RemovalOutcome,
};
use absentia_domain::{
    AbsenceRecord, AbsenceRecordId, AbsenceStatus, AbsenceType, AbsenceTypeId, DateRange, Employee,
    EmployeeId, EmployeeStatus, ProcessingLog, ProcessingLogId, ProcessingStatus, RecordSource,
    TenantId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, TransactionBehavior};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Message raised by the overlap trigger in `schema.sql`
const OVERLAP_TRIGGER_MESSAGE: &str = "absence_overlap";

const EMPLOYEE_COLUMNS: &str =
    "id, tenant_id, first_name, last_name, email, employee_number, department, status";

const ABSENCE_TYPE_COLUMNS: &str = "id, tenant_id, name, code, is_paid, requires_approval, \
     max_days_per_year, advance_notice_days, color, is_active";

const RECORD_COLUMNS: &str = "id, tenant_id, employee_id, absence_type_id, start_date, end_date, \
     total_days, reason, notes, status, source, source_reference, confidence_score, created_by, \
     approved_by, approved_at, created_at";

const LOG_COLUMNS: &str = "id, tenant_id, processing_type, provider, input_data, ai_response, \
     confidence_score, status, error_message, processing_time_ms, tokens_used, cost_usd, \
     related_record_id, created_at, completed_at";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of the pipeline's storage traits
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store behind a mutex or
/// give each thread its own `SqliteStore` on the same database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or replace an employee
    pub fn upsert_employee(&mut self, employee: &Employee) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO employees (id, tenant_id, first_name, last_name, email, employee_number, department, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                employee_number = excluded.employee_number,
                department = excluded.department,
                status = excluded.status",
            params![
                employee.id.as_uuid(),
                employee.tenant_id.as_uuid(),
                &employee.first_name,
                &employee.last_name,
                &employee.email,
                &employee.employee_number,
                &employee.department,
                employee.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Insert or replace an absence type
    ///
    /// The code must be unique within the tenant.
    pub fn upsert_absence_type(&mut self, absence_type: &AbsenceType) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO absence_types (id, tenant_id, name, code, is_paid, requires_approval,
                                        max_days_per_year, advance_notice_days, color, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                code = excluded.code,
                is_paid = excluded.is_paid,
                requires_approval = excluded.requires_approval,
                max_days_per_year = excluded.max_days_per_year,
                advance_notice_days = excluded.advance_notice_days,
                color = excluded.color,
                is_active = excluded.is_active",
            params![
                absence_type.id.as_uuid(),
                absence_type.tenant_id.as_uuid(),
                &absence_type.name,
                &absence_type.code,
                absence_type.is_paid,
                absence_type.requires_approval,
                absence_type.max_days_per_year,
                absence_type.advance_notice_days,
                &absence_type.color,
                absence_type.is_active,
            ],
        )?;
        Ok(())
    }

    fn query_overlapping(
        conn: &Connection,
        employee_id: EmployeeId,
        range: DateRange,
        exclude_statuses: &[AbsenceStatus],
    ) -> Result<Vec<AbsenceRecord>, StoreError> {
        let mut sql = format!(
            "SELECT {} FROM absence_records
             WHERE employee_id = ? AND start_date <= ? AND end_date >= ?",
            RECORD_COLUMNS
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![
            Box::new(*employee_id.as_uuid()),
            Box::new(range.end()),
            Box::new(range.start()),
        ];

        if !exclude_statuses.is_empty() {
            let placeholders = vec!["?"; exclude_statuses.len()].join(", ");
            sql.push_str(&format!(" AND status NOT IN ({})", placeholders));
            for status in exclude_statuses {
                params.push(Box::new(status.as_str()));
            }
        }
        sql.push_str(" ORDER BY start_date");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let records = stmt
            .query_map(&param_refs[..], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl EmployeeDirectory for SqliteStore {
    type Error = StoreError;

    fn employees(&self, tenant_id: TenantId) -> Result<Vec<Employee>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM employees WHERE tenant_id = ?1 ORDER BY last_name, first_name",
            EMPLOYEE_COLUMNS
        ))?;
        let employees = stmt
            .query_map(params![tenant_id.as_uuid()], employee_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }
}

impl AbsenceTypeCatalog for SqliteStore {
    type Error = StoreError;

    fn absence_types(&self, tenant_id: TenantId) -> Result<Vec<AbsenceType>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM absence_types WHERE tenant_id = ?1 ORDER BY name",
            ABSENCE_TYPE_COLUMNS
        ))?;
        let types = stmt
            .query_map(params![tenant_id.as_uuid()], absence_type_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }

    fn absence_type(&self, id: AbsenceTypeId) -> Result<Option<AbsenceType>, Self::Error> {
        let absence_type = self
            .conn
            .query_row(
                &format!("SELECT {} FROM absence_types WHERE id = ?1", ABSENCE_TYPE_COLUMNS),
                params![id.as_uuid()],
                absence_type_from_row,
            )
            .optional()?;
        Ok(absence_type)
    }

    fn remove_absence_type(&mut self, id: AbsenceTypeId) -> Result<RemovalOutcome, Self::Error> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx
            .query_row("SELECT 1 FROM absence_types WHERE id = ?1", params![id.as_uuid()], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Ok(RemovalOutcome::NotFound);
        }

        let references: i64 = tx.query_row(
            "SELECT COUNT(*) FROM absence_records WHERE absence_type_id = ?1",
            params![id.as_uuid()],
            |row| row.get(0),
        )?;

        let outcome = if references > 0 {
            tx.execute("UPDATE absence_types SET is_active = 0 WHERE id = ?1", params![id.as_uuid()])?;
            debug!("Absence type {} referenced by {} records, deactivated", id, references);
            RemovalOutcome::Deactivated
        } else {
            tx.execute("DELETE FROM absence_types WHERE id = ?1", params![id.as_uuid()])?;
            debug!("Absence type {} deleted", id);
            RemovalOutcome::Deleted
        };

        tx.commit()?;
        Ok(outcome)
    }
}

impl AbsenceRecordStore for SqliteStore {
    type Error = StoreError;

    fn create_record(&mut self, record: &AbsenceRecord) -> Result<CreateOutcome, Self::Error> {
        // Immediate: take the write lock before reading so the check and the
        // insert see the same state
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if record.status.blocks_overlap() {
            let conflicts =
                Self::query_overlapping(&tx, record.employee_id, record.range(), &AbsenceStatus::NON_BLOCKING)?;
            if !conflicts.is_empty() {
                debug!(
                    "Record for employee {} overlaps {} existing records",
                    record.employee_id,
                    conflicts.len()
                );
                return Ok(CreateOutcome::Conflict(conflicts));
            }
        }

        let inserted = tx.execute(
            &format!(
                "INSERT INTO absence_records ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                RECORD_COLUMNS
            ),
            params![
                record.id.as_uuid(),
                record.tenant_id.as_uuid(),
                record.employee_id.as_uuid(),
                record.absence_type_id.as_uuid(),
                record.start_date,
                record.end_date,
                record.total_days,
                &record.reason,
                &record.notes,
                record.status.as_str(),
                record.source.as_str(),
                record.source_reference.map(|id| *id.as_uuid()),
                record.confidence_score,
                &record.created_by,
                &record.approved_by,
                record.approved_at,
                record.created_at,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_overlap_violation(&e) => {
                warn!("Overlap trigger rejected record {} for employee {}", record.id, record.employee_id);
                let conflicts =
                    Self::query_overlapping(&tx, record.employee_id, record.range(), &AbsenceStatus::NON_BLOCKING)?;
                return Ok(CreateOutcome::Conflict(conflicts));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(CreateOutcome::Created(record.id))
    }

    fn find_overlapping(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
        exclude_statuses: &[AbsenceStatus],
    ) -> Result<Vec<AbsenceRecord>, Self::Error> {
        Self::query_overlapping(&self.conn, employee_id, range, exclude_statuses)
    }

    fn get_record(&self, id: AbsenceRecordId) -> Result<Option<AbsenceRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM absence_records WHERE id = ?1", RECORD_COLUMNS),
                params![id.as_uuid()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn update_record_status(&mut self, record: &AbsenceRecord) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE absence_records
             SET status = ?2, notes = ?3, approved_by = ?4, approved_at = ?5
             WHERE id = ?1",
            params![
                record.id.as_uuid(),
                record.status.as_str(),
                &record.notes,
                &record.approved_by,
                record.approved_at,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("absence record {}", record.id)));
        }
        Ok(())
    }

    fn records_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AbsenceRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM absence_records WHERE tenant_id = ?1 ORDER BY start_date",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![tenant_id.as_uuid()], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl ProcessingLogStore for SqliteStore {
    type Error = StoreError;

    fn insert_log(&mut self, log: &ProcessingLog) -> Result<(), Self::Error> {
        self.conn.execute(
            &format!(
                "INSERT INTO processing_logs ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                LOG_COLUMNS
            ),
            params![
                log.id.as_uuid(),
                log.tenant_id.as_uuid(),
                &log.processing_type,
                &log.provider,
                &log.input_data,
                &log.ai_response,
                log.confidence_score,
                log.status.as_str(),
                &log.error_message,
                log.processing_time_ms as i64,
                log.tokens_used as i64,
                log.cost_usd,
                log.related_record_id.map(|id| *id.as_uuid()),
                log.created_at,
                log.completed_at,
            ],
        )?;
        Ok(())
    }

    fn update_log(&mut self, log: &ProcessingLog) -> Result<(), Self::Error> {
        let updated = self.conn.execute(
            "UPDATE processing_logs
             SET provider = ?2, input_data = ?3, ai_response = ?4, confidence_score = ?5,
                 status = ?6, error_message = ?7, processing_time_ms = ?8, tokens_used = ?9,
                 cost_usd = ?10, related_record_id = ?11, completed_at = ?12
             WHERE id = ?1",
            params![
                log.id.as_uuid(),
                &log.provider,
                &log.input_data,
                &log.ai_response,
                log.confidence_score,
                log.status.as_str(),
                &log.error_message,
                log.processing_time_ms as i64,
                log.tokens_used as i64,
                log.cost_usd,
                log.related_record_id.map(|id| *id.as_uuid()),
                log.completed_at,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("processing log {}", log.id)));
        }
        Ok(())
    }

    fn get_log(&self, id: ProcessingLogId) -> Result<Option<ProcessingLog>, Self::Error> {
        let log = self
            .conn
            .query_row(
                &format!("SELECT {} FROM processing_logs WHERE id = ?1", LOG_COLUMNS),
                params![id.as_uuid()],
                log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    fn logs_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<ProcessingLog>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM processing_logs WHERE tenant_id = ?1 ORDER BY created_at, id",
            LOG_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![tenant_id.as_uuid()], log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

fn is_overlap_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains(OVERLAP_TRIGGER_MESSAGE)
    )
}

fn invalid_column(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(StoreError::InvalidData(message)))
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    let status: String = row.get(7)?;
    Ok(Employee {
        id: EmployeeId::from_uuid(row.get(0)?),
        tenant_id: TenantId::from_uuid(row.get(1)?),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        employee_number: row.get(5)?,
        department: row.get(6)?,
        status: EmployeeStatus::parse(&status)
            .ok_or_else(|| invalid_column(7, format!("Unknown employee status: {}", status)))?,
    })
}

fn absence_type_from_row(row: &Row<'_>) -> rusqlite::Result<AbsenceType> {
    Ok(AbsenceType {
        id: AbsenceTypeId::from_uuid(row.get(0)?),
        tenant_id: TenantId::from_uuid(row.get(1)?),
        name: row.get(2)?,
        code: row.get(3)?,
        is_paid: row.get(4)?,
        requires_approval: row.get(5)?,
        max_days_per_year: row.get(6)?,
        advance_notice_days: row.get(7)?,
        color: row.get(8)?,
        is_active: row.get(9)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AbsenceRecord> {
    let status: String = row.get(9)?;
    let source: String = row.get(10)?;
    let source_reference: Option<uuid::Uuid> = row.get(11)?;

    Ok(AbsenceRecord {
        id: AbsenceRecordId::from_uuid(row.get(0)?),
        tenant_id: TenantId::from_uuid(row.get(1)?),
        employee_id: EmployeeId::from_uuid(row.get(2)?),
        absence_type_id: AbsenceTypeId::from_uuid(row.get(3)?),
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        total_days: row.get(6)?,
        reason: row.get(7)?,
        notes: row.get(8)?,
        status: AbsenceStatus::parse(&status)
            .ok_or_else(|| invalid_column(9, format!("Unknown absence status: {}", status)))?,
        source: RecordSource::parse(&source)
            .ok_or_else(|| invalid_column(10, format!("Unknown record source: {}", source)))?,
        source_reference: source_reference.map(ProcessingLogId::from_uuid),
        confidence_score: row.get(12)?,
        created_by: row.get(13)?,
        approved_by: row.get(14)?,
        approved_at: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<ProcessingLog> {
    let status: String = row.get(7)?;
    let related_record_id: Option<uuid::Uuid> = row.get(12)?;

    Ok(ProcessingLog {
        id: ProcessingLogId::from_uuid(row.get(0)?),
        tenant_id: TenantId::from_uuid(row.get(1)?),
        processing_type: row.get(2)?,
        provider: row.get(3)?,
        input_data: row.get(4)?,
        ai_response: row.get(5)?,
        confidence_score: row.get(6)?,
        status: ProcessingStatus::parse(&status)
            .ok_or_else(|| invalid_column(7, format!("Unknown processing status: {}", status)))?,
        error_message: row.get(8)?,
        processing_time_ms: row.get::<_, i64>(9)? as u64,
        tokens_used: row.get::<_, i64>(10)? as u64,
        cost_usd: row.get(11)?,
        related_record_id: related_record_id.map(AbsenceRecordId::from_uuid),
        created_at: row.get(13)?,
        completed_at: row.get(14)?,
    })
}
