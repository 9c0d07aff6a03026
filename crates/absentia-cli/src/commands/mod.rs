//! Command implementations.

pub mod feedback;
pub mod process;
pub mod records;
pub mod remove_type;
pub mod roster;
pub mod stats;

pub use self::feedback::execute_feedback;
pub use self::process::execute_process;
pub use self::records::{execute_approve, execute_cancel, execute_records, execute_reject};
pub use self::remove_type::execute_remove_type;
pub use self::roster::execute_import_roster;
pub use self::stats::execute_stats;

use crate::error::{CliError, Result};

/// Parse one of the UUID-backed identifiers.
pub(crate) fn parse_id<T>(kind: &str, raw: &str, parse: impl Fn(&str) -> std::result::Result<T, String>) -> Result<T> {
    parse(raw.trim()).map_err(|e| CliError::InvalidInput(format!("Invalid {} id '{}': {}", kind, raw, e)))
}
