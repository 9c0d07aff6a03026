//! Identifier newtypes
//!
//! Every entity is keyed by a UUIDv7 so ids sort by creation time and can be
//! generated without coordination. Each entity gets its own newtype so an
//! employee id can never be passed where an absence-type id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse an identifier from its hyphenated string form
            pub fn from_string(s: &str) -> Result<Self, String> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

entity_id!(
    /// Tenant (company) that owns employees, types and records
    TenantId
);
entity_id!(
    /// Employee identifier
    EmployeeId
);
entity_id!(
    /// Absence type identifier
    AbsenceTypeId
);
entity_id!(
    /// Absence record identifier
    AbsenceRecordId
);
entity_id!(
    /// Processing log entry identifier
    ProcessingLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_chronological() {
        let first = EmployeeId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = EmployeeId::new();
        assert!(first < second);
    }

    #[test]
    fn test_display_and_parse() {
        let id = AbsenceTypeId::new();
        let parsed: AbsenceTypeId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_invalid_string() {
        assert!(TenantId::from_string("not-a-uuid").is_err());
        assert!(TenantId::from_string("").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProcessingLogId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
