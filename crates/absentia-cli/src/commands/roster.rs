//! Import-roster command implementation.
//!
//! The roster file is JSON:
//!
//! ```json
//! {
//!   "tenant_id": "0190f5d2-...",
//!   "employees": [
//!     { "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" }
//!   ],
//!   "absence_types": [
//!     { "name": "Sick Leave", "code": "SICK", "requires_approval": false }
//!   ]
//! }
//! ```
//!
//! Entries without an `id` are matched to existing rows (employees by email or
//! employee number, absence types by code) so a file can be imported again.

use super::parse_id;
use crate::cli::ImportRosterArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use absentia_domain::traits::{AbsenceTypeCatalog, EmployeeDirectory};
use absentia_domain::{AbsenceType, AbsenceTypeId, Employee, EmployeeId, EmployeeStatus, TenantId};
use absentia_pipeline::PipelineConfig;
use absentia_store::SqliteStore;
use serde::Deserialize;
use std::fs;
use tracing::info;

/// Execute the import-roster command.
pub fn execute_import_roster(args: ImportRosterArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let contents = fs::read_to_string(&args.file)?;
    let roster: RosterFile = serde_json::from_str(&contents)?;

    let mut store = SqliteStore::new(&config.database_path)?;
    let (employees, absence_types) = import(&mut store, roster)?;
    info!("Imported {} employees and {} absence types", employees, absence_types);

    println!(
        "{}",
        formatter.success(&format!(
            "Imported {} employee(s) and {} absence type(s)",
            employees, absence_types
        ))
    );
    Ok(())
}

/// Upsert every entry of `roster`, returning how many of each kind were written.
pub fn import(store: &mut SqliteStore, roster: RosterFile) -> Result<(usize, usize)> {
    let tenant = parse_id("tenant", &roster.tenant_id, TenantId::from_string)?;

    let existing_employees = store.employees(tenant)?;
    for def in &roster.employees {
        let employee = def.to_employee(tenant, &existing_employees)?;
        store.upsert_employee(&employee)?;
    }

    let existing_types = store.absence_types(tenant)?;
    for def in &roster.absence_types {
        let absence_type = def.to_absence_type(tenant, &existing_types)?;
        store.upsert_absence_type(&absence_type)?;
    }

    Ok((roster.employees.len(), roster.absence_types.len()))
}

/// Roster file contents.
#[derive(Debug, Deserialize)]
pub struct RosterFile {
    tenant_id: String,
    #[serde(default)]
    employees: Vec<EmployeeDefinition>,
    #[serde(default)]
    absence_types: Vec<AbsenceTypeDefinition>,
}

#[derive(Debug, Deserialize)]
struct EmployeeDefinition {
    #[serde(default)]
    id: Option<String>,
    first_name: String,
    last_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    employee_number: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbsenceTypeDefinition {
    #[serde(default)]
    id: Option<String>,
    name: String,
    code: String,
    #[serde(default = "default_true")]
    is_paid: bool,
    #[serde(default = "default_true")]
    requires_approval: bool,
    #[serde(default)]
    max_days_per_year: Option<u32>,
    #[serde(default)]
    advance_notice_days: u32,
    #[serde(default)]
    color: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

impl EmployeeDefinition {
    fn to_employee(&self, tenant: TenantId, existing: &[Employee]) -> Result<Employee> {
        let id = match &self.id {
            Some(raw) => parse_id("employee", raw, EmployeeId::from_string)?,
            None => existing
                .iter()
                .find(|e| {
                    (self.email.is_some() && e.email.as_deref().map(str::to_lowercase)
                        == self.email.as_deref().map(str::to_lowercase))
                        || (self.employee_number.is_some() && e.employee_number == self.employee_number)
                })
                .map(|e| e.id)
                .unwrap_or_default(),
        };
        let status = match &self.status {
            Some(raw) => EmployeeStatus::parse(raw)
                .ok_or_else(|| CliError::InvalidInput(format!("Unknown employee status '{}'", raw)))?,
            None => EmployeeStatus::Active,
        };

        let mut employee = Employee::new(tenant, &self.first_name, &self.last_name);
        employee.id = id;
        employee.email = self.email.clone();
        employee.employee_number = self.employee_number.clone();
        employee.department = self.department.clone();
        employee.status = status;
        Ok(employee)
    }
}

impl AbsenceTypeDefinition {
    fn to_absence_type(&self, tenant: TenantId, existing: &[AbsenceType]) -> Result<AbsenceType> {
        if self.code.trim().is_empty() {
            return Err(CliError::InvalidInput(format!("Absence type '{}' has no code", self.name)));
        }
        let id = match &self.id {
            Some(raw) => parse_id("absence type", raw, AbsenceTypeId::from_string)?,
            None => existing
                .iter()
                .find(|t| t.code.eq_ignore_ascii_case(&self.code))
                .map(|t| t.id)
                .unwrap_or_default(),
        };

        let mut absence_type = AbsenceType::new(tenant, &self.name, &self.code)
            .with_requires_approval(self.requires_approval)
            .with_paid(self.is_paid);
        absence_type.id = id;
        absence_type.max_days_per_year = self.max_days_per_year;
        absence_type.advance_notice_days = self.advance_notice_days;
        absence_type.is_active = self.is_active;
        if let Some(color) = &self.color {
            absence_type.color = color.clone();
        }
        Ok(absence_type)
    }
}

fn default_true() -> bool {
    true
}
