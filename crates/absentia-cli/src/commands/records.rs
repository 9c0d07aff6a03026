//! Record review commands: list, approve, reject, cancel.

use super::parse_id;
use crate::cli::{ApproveArgs, CancelArgs, RejectArgs, StatsArgs};
use crate::error::Result;
use crate::output::Formatter;
use absentia_domain::{AbsenceRecordId, TenantId};
use absentia_pipeline::{AbsencePipeline, PipelineConfig};
use absentia_store::SqliteStore;

fn open(config: &PipelineConfig) -> Result<AbsencePipeline<SqliteStore>> {
    Ok(AbsencePipeline::<SqliteStore>::open_for_review(config.clone())?)
}

/// Execute the records command.
pub fn execute_records(args: StatsArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let tenant = parse_id("tenant", &args.tenant, TenantId::from_string)?;
    let records = open(config)?.records(tenant)?;
    println!("{}", formatter.records(&records)?);
    Ok(())
}

/// Execute the approve command.
pub fn execute_approve(args: ApproveArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let id = parse_id("absence record", &args.id, AbsenceRecordId::from_string)?;
    let record = open(config)?.approve_record(id, &args.approver)?;
    println!("{}", formatter.success(&format!("Record {} approved", id)));
    println!("{}", formatter.record(&record)?);
    Ok(())
}

/// Execute the reject command.
pub fn execute_reject(args: RejectArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let id = parse_id("absence record", &args.id, AbsenceRecordId::from_string)?;
    let record = open(config)?.reject_record(id, &args.reviewer, args.notes.as_deref())?;
    println!("{}", formatter.success(&format!("Record {} rejected", id)));
    println!("{}", formatter.record(&record)?);
    Ok(())
}

/// Execute the cancel command.
pub fn execute_cancel(args: CancelArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let id = parse_id("absence record", &args.id, AbsenceRecordId::from_string)?;
    let record = open(config)?.cancel_record(id)?;
    println!("{}", formatter.success(&format!("Record {} cancelled", id)));
    println!("{}", formatter.record(&record)?);
    Ok(())
}
