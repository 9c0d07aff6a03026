//! Employee module - people absences are recorded for

use crate::ids::{EmployeeId, TenantId};
use serde::{Deserialize, Serialize};

/// Employment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmployeeStatus {
    /// Currently employed and working
    Active,
    /// Employed but not currently active
    Inactive,
    /// No longer employed
    Terminated,
    /// Employed and on an extended leave
    OnLeave,
}

impl EmployeeStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::Terminated => "terminated",
            EmployeeStatus::OnLeave => "on-leave",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "active" => Some(EmployeeStatus::Active),
            "inactive" => Some(EmployeeStatus::Inactive),
            "terminated" => Some(EmployeeStatus::Terminated),
            "on-leave" => Some(EmployeeStatus::OnLeave),
            _ => None,
        }
    }
}

impl std::str::FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid employee status: {}", s))
    }
}

/// A tenant-scoped person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier
    pub id: EmployeeId,

    /// Owning tenant
    pub tenant_id: TenantId,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Work email, used for sender matching
    pub email: Option<String>,

    /// External HR/payroll employee number
    pub employee_number: Option<String>,

    /// Department name
    pub department: Option<String>,

    /// Employment status
    pub status: EmployeeStatus,
}

impl Employee {
    /// Create an active employee with no optional fields set
    pub fn new(tenant_id: TenantId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: EmployeeId::new(),
            tenant_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            employee_number: None,
            department: None,
            status: EmployeeStatus::Active,
        }
    }

    /// Set the work email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the external employee number
    pub fn with_employee_number(mut self, number: impl Into<String>) -> Self {
        self.employee_number = Some(number.into());
        self
    }

    /// Set the department
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// "First Last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Whether absences may still be recorded for this employee
    pub fn is_employed(&self) -> bool {
        self.status != EmployeeStatus::Terminated
    }
}
