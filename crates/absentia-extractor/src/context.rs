//! Request context: the closed set of employees and absence types a provider
//! may reference
//!
//! Anything an extraction names that is not in here is discarded during
//! normalization.

use crate::error::ExtractorError;
use absentia_domain::traits::{AbsenceTypeCatalog, EmployeeDirectory};
use absentia_domain::{AbsenceType, AbsenceTypeId, Employee, EmployeeId, EmployeeStatus, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::debug;

/// Trigger word and the keywords it adds
const SYNONYMS: &[(&str, &[&str])] = &[
    ("annual", &["vacation", "holiday", "leave", "pto", "time off"]),
    ("vacation", &["vacation", "holiday", "leave", "pto", "time off"]),
    ("holiday", &["vacation", "holiday", "leave", "pto", "time off"]),
    ("sick", &["illness", "medical", "doctor", "unwell", "health"]),
    ("personal", &["personal", "private", "family", "errand"]),
    ("maternity", &["maternity", "pregnancy", "birth", "baby"]),
    ("paternity", &["paternity", "newborn", "father", "baby"]),
    ("parental", &["parental", "childcare", "parent", "baby"]),
    ("bereavement", &["bereavement", "funeral", "death", "loss", "compassionate"]),
    ("training", &["training", "course", "conference", "seminar", "education"]),
    ("unpaid", &["unpaid", "without pay", "leave of absence"]),
    ("remote", &["remote", "work from home", "wfh", "home office"]),
];

/// Employee as shown to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    /// Roster id
    pub id: EmployeeId,
    /// "First Last"
    pub display_name: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// External employee number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    /// Department
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl From<&Employee> for EmployeeEntry {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            display_name: employee.display_name(),
            email: employee.email.clone(),
            employee_number: employee.employee_number.clone(),
            department: employee.department.clone(),
        }
    }
}

/// Absence type as shown to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceTypeEntry {
    /// Taxonomy id
    pub id: AbsenceTypeId,
    /// Display name
    pub name: String,
    /// Tenant-unique code
    pub code: String,
    /// Words hinting at this type
    pub keywords: Vec<String>,
}

impl From<&AbsenceType> for AbsenceTypeEntry {
    fn from(absence_type: &AbsenceType) -> Self {
        Self {
            id: absence_type.id,
            name: absence_type.name.clone(),
            code: absence_type.code.clone(),
            keywords: keywords_for(&absence_type.name, &absence_type.code),
        }
    }
}

/// Trusted roster for one tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Employees a request may come from
    pub employees: Vec<EmployeeEntry>,
    /// Absence types a request may ask for
    pub absence_types: Vec<AbsenceTypeEntry>,
}

impl RequestContext {
    /// Create a context from ready-made entries
    pub fn new(employees: Vec<EmployeeEntry>, absence_types: Vec<AbsenceTypeEntry>) -> Self {
        Self {
            employees,
            absence_types,
        }
    }

    /// Whether `id` is a known employee
    pub fn contains_employee(&self, id: EmployeeId) -> bool {
        self.employees.iter().any(|e| e.id == id)
    }

    /// Whether `id` is a known absence type
    pub fn contains_absence_type(&self, id: AbsenceTypeId) -> bool {
        self.absence_types.iter().any(|t| t.id == id)
    }

    /// Load the roster of `tenant_id`
    ///
    /// Terminated employees and inactive absence types are left out. At most
    /// `max_entries` of each kind are kept.
    pub fn load<D, C>(
        directory: &D,
        catalog: &C,
        tenant_id: TenantId,
        max_entries: usize,
    ) -> Result<Self, ExtractorError>
    where
        D: EmployeeDirectory,
        D::Error: Display,
        C: AbsenceTypeCatalog,
        C::Error: Display,
    {
        let employees: Vec<EmployeeEntry> = directory
            .employees(tenant_id)
            .map_err(|e| ExtractorError::Context(format!("Failed to load employees: {}", e)))?
            .iter()
            .filter(|e| e.status != EmployeeStatus::Terminated)
            .take(max_entries)
            .map(EmployeeEntry::from)
            .collect();

        let absence_types: Vec<AbsenceTypeEntry> = catalog
            .absence_types(tenant_id)
            .map_err(|e| ExtractorError::Context(format!("Failed to load absence types: {}", e)))?
            .iter()
            .filter(|t| t.is_active)
            .take(max_entries)
            .map(AbsenceTypeEntry::from)
            .collect();

        debug!(
            "Context for tenant {}: {} employees, {} absence types",
            tenant_id,
            employees.len(),
            absence_types.len()
        );

        Ok(Self::new(employees, absence_types))
    }
}

/// Keywords for an absence type: the lowercased name words, the lowercased
/// code and the synonyms of any trigger word among them, sorted and unique
pub fn keywords_for(name: &str, code: &str) -> Vec<String> {
    let mut keywords = BTreeSet::new();

    let name_lower = name.to_lowercase();
    let code_lower = code.trim().to_lowercase();
    let words = name_lower
        .split(|c: char| !c.is_alphanumeric())
        .chain(code_lower.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>();

    for word in name_lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        keywords.insert(word.to_string());
    }
    if !code_lower.is_empty() {
        keywords.insert(code_lower.clone());
    }

    for (trigger, synonyms) in SYNONYMS {
        if words.iter().any(|w| w == trigger) {
            keywords.extend(synonyms.iter().map(|s| s.to_string()));
        }
    }

    keywords.into_iter().collect()
}
