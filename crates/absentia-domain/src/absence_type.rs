//! Absence type taxonomy

use crate::absence_record::AbsenceStatus;
use crate::ids::{AbsenceTypeId, TenantId};
use serde::{Deserialize, Serialize};

/// Tenant-defined leave category (e.g. Sick, Annual Leave)
///
/// The `id` never changes once a record references the type. Types that are
/// referenced are deactivated rather than deleted, see
/// [`AbsenceTypeCatalog::remove_absence_type`](crate::traits::AbsenceTypeCatalog::remove_absence_type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceType {
    /// Unique identifier
    pub id: AbsenceTypeId,

    /// Owning tenant
    pub tenant_id: TenantId,

    /// Human-readable name
    pub name: String,

    /// Short code, unique per tenant (e.g. "SICK")
    pub code: String,

    /// Whether the absence is paid
    pub is_paid: bool,

    /// Whether new records start pending instead of approved
    pub requires_approval: bool,

    /// Annual allowance in days, if capped
    pub max_days_per_year: Option<u32>,

    /// Days of notice expected before the absence starts
    pub advance_notice_days: u32,

    /// Display color (hex)
    pub color: String,

    /// Inactive types cannot be matched by extraction
    pub is_active: bool,
}

impl AbsenceType {
    /// Create an active, paid type that requires approval
    pub fn new(tenant_id: TenantId, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: AbsenceTypeId::new(),
            tenant_id,
            name: name.into(),
            code: code.into(),
            is_paid: true,
            requires_approval: true,
            max_days_per_year: None,
            advance_notice_days: 0,
            color: "#3B82F6".to_string(),
            is_active: true,
        }
    }

    /// Set whether records of this type require approval
    pub fn with_requires_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    /// Set whether the absence is paid
    pub fn with_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    /// Status a newly created record of this type starts in
    pub fn initial_status(&self) -> AbsenceStatus {
        if self.requires_approval {
            AbsenceStatus::Pending
        } else {
            AbsenceStatus::Approved
        }
    }
}
