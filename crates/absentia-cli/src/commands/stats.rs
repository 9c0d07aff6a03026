//! Stats command implementation.

use super::parse_id;
use crate::cli::StatsArgs;
use crate::error::Result;
use crate::output::Formatter;
use absentia_domain::TenantId;
use absentia_pipeline::{AbsencePipeline, PipelineConfig};
use absentia_store::SqliteStore;

/// Execute the stats command.
pub fn execute_stats(args: StatsArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let tenant = parse_id("tenant", &args.tenant, TenantId::from_string)?;
    let pipeline = AbsencePipeline::<SqliteStore>::open_for_review(config.clone())?;

    let stats = pipeline.processing_stats(tenant)?;
    println!("{}", formatter.stats(&stats)?);
    Ok(())
}
