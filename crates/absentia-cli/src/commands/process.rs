//! Process command implementation.

use super::parse_id;
use crate::cli::ProcessArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use absentia_domain::TenantId;
use absentia_extractor::EmailMessage;
use absentia_pipeline::{AbsencePipeline, PipelineConfig};
use absentia_store::SqliteStore;
use std::fs;
use std::io::{self, Read};

/// Execute the process command.
pub async fn execute_process(args: ProcessArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let tenant = parse_id("tenant", &args.tenant, TenantId::from_string)?;

    let body = if let Some(body) = args.body {
        body
    } else if let Some(path) = args.body_file {
        fs::read_to_string(path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };
    if body.trim().is_empty() {
        return Err(CliError::InvalidInput("Email body is empty".to_string()));
    }

    let email = EmailMessage::new(args.subject, body, args.sender);
    let pipeline = AbsencePipeline::<SqliteStore>::from_config(config.clone())?;
    let response = pipeline.process_email(tenant, &email, !args.no_auto_create).await?;

    println!("{}", formatter.process_response(&response)?);
    Ok(())
}
