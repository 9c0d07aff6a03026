//! Feedback command implementation.

use super::parse_id;
use crate::cli::FeedbackArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use absentia_domain::ProcessingLogId;
use absentia_pipeline::{AbsencePipeline, Feedback, PipelineConfig};
use absentia_store::SqliteStore;
use serde_json::Value;

/// Execute the feedback command.
pub fn execute_feedback(args: FeedbackArgs, config: &PipelineConfig, formatter: &Formatter) -> Result<()> {
    let log_id = parse_id("processing log", &args.log_id, ProcessingLogId::from_string)?;
    let feedback = build_feedback(&args)?;

    let pipeline = AbsencePipeline::<SqliteStore>::open_for_review(config.clone())?;
    let log = pipeline.submit_feedback(log_id, feedback)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Feedback recorded on run {} ({} entries)",
            log.id,
            log.feedback().len()
        ))
    );
    Ok(())
}

fn build_feedback(args: &FeedbackArgs) -> Result<Feedback> {
    let corrections = match &args.corrections {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)?;
            if !value.is_object() {
                return Err(CliError::InvalidInput("Corrections must be a JSON object".to_string()));
            }
            Some(value)
        }
        None => None,
    };

    Ok(Feedback {
        is_correct: !args.incorrect,
        corrections,
        comments: args.comments.clone(),
    })
}
