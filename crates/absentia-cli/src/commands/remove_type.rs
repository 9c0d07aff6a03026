//! Remove-type command implementation.

use super::parse_id;
use crate::cli::RemoveTypeArgs;
use crate::error::Result;
use crate::output::Formatter;
use absentia_domain::traits::RemovalOutcome;
use absentia_domain::AbsenceTypeId;
use absentia_pipeline::{AbsencePipeline, PipelineConfig};
use absentia_store::SqliteStore;

/// Execute the remove-type command.
pub fn execute_remove_type(args: RemoveTypeArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let id = parse_id("absence type", &args.id, AbsenceTypeId::from_string)?;
    let pipeline = AbsencePipeline::<SqliteStore>::open_for_review(config.clone())?;

    let message = match pipeline.remove_absence_type(id)? {
        RemovalOutcome::Deleted => formatter.success(&format!("Absence type {} deleted", id)),
        RemovalOutcome::Deactivated => formatter.warning(&format!(
            "Absence type {} is used by existing records; deactivated instead",
            id
        )),
        RemovalOutcome::NotFound => formatter.error(&format!("Absence type {} not found", id)),
    };
    println!("{}", message);
    Ok(())
}
