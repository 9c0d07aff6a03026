//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its storage
//! collaborators. Implementations live in other crates (`absentia-store`).

use crate::{
    AbsenceRecord, AbsenceRecordId, AbsenceStatus, AbsenceType, AbsenceTypeId, DateRange, Employee,
    EmployeeId, ProcessingLog, ProcessingLogId, TenantId,
};

/// Read access to the employee roster
pub trait EmployeeDirectory {
    /// Error type for directory operations
    type Error;

    /// All employees of a tenant
    fn employees(&self, tenant_id: TenantId) -> Result<Vec<Employee>, Self::Error>;
}

/// What happened to a removal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// No record referenced the type; it is gone
    Deleted,
    /// Records reference the type; it was deactivated instead
    Deactivated,
    /// No such type
    NotFound,
}

/// Access to the absence-type taxonomy
pub trait AbsenceTypeCatalog {
    /// Error type for catalog operations
    type Error;

    /// All absence types of a tenant, active or not
    fn absence_types(&self, tenant_id: TenantId) -> Result<Vec<AbsenceType>, Self::Error>;

    /// Get an absence type by id
    fn absence_type(&self, id: AbsenceTypeId) -> Result<Option<AbsenceType>, Self::Error>;

    /// Remove a type, deactivating it instead when any record references it
    fn remove_absence_type(&mut self, id: AbsenceTypeId) -> Result<RemovalOutcome, Self::Error>;
}

/// Result of an insert that must not overlap existing leave
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// Record stored
    Created(AbsenceRecordId),
    /// Blocking records already cover some of the days; nothing stored
    Conflict(Vec<AbsenceRecord>),
}

/// Durable absence records
pub trait AbsenceRecordStore {
    /// Error type for store operations
    type Error;

    /// Insert a record unless it overlaps a pending or approved record of the
    /// same employee
    ///
    /// The overlap check and the insert are one atomic unit.
    fn create_record(&mut self, record: &AbsenceRecord) -> Result<CreateOutcome, Self::Error>;

    /// Records of `employee_id` overlapping `range` whose status is not in `exclude_statuses`
    fn find_overlapping(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
        exclude_statuses: &[AbsenceStatus],
    ) -> Result<Vec<AbsenceRecord>, Self::Error>;

    /// Get a record by id
    fn get_record(&self, id: AbsenceRecordId) -> Result<Option<AbsenceRecord>, Self::Error>;

    /// Persist a status change made through the record's transition methods
    fn update_record_status(&mut self, record: &AbsenceRecord) -> Result<(), Self::Error>;

    /// All records of a tenant
    fn records_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AbsenceRecord>, Self::Error>;
}

/// Durable processing log
pub trait ProcessingLogStore {
    /// Error type for log operations
    type Error;

    /// Persist a newly opened log entry
    fn insert_log(&mut self, log: &ProcessingLog) -> Result<(), Self::Error>;

    /// Persist the current state of an existing entry
    fn update_log(&mut self, log: &ProcessingLog) -> Result<(), Self::Error>;

    /// Get a log entry by id
    fn get_log(&self, id: ProcessingLogId) -> Result<Option<ProcessingLog>, Self::Error>;

    /// All log entries of a tenant, oldest first
    fn logs_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<ProcessingLog>, Self::Error>;
}
