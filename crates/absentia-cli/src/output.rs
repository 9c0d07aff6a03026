//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use absentia_domain::AbsenceRecord;
use absentia_pipeline::{ProcessEmailResponse, ProcessingStats, RunOutcome};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of a pipeline run.
    pub fn process_response(&self, response: &ProcessEmailResponse) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
            OutputFormat::Quiet => Ok(match &response.absence_record {
                Some(record) => format!("{}\n{}", response.processing_log_id, record.id),
                None => response.processing_log_id.to_string(),
            }),
            OutputFormat::Table => Ok(self.process_table(response)),
        }
    }

    fn process_table(&self, response: &ProcessEmailResponse) -> String {
        let mut rows: Vec<(String, String)> = vec![
            ("Outcome".into(), response.outcome.label().into()),
            ("Processing log".into(), response.processing_log_id.to_string()),
            ("Time".into(), format!("{} ms", response.processing_time_ms)),
        ];

        if let Some(parsed) = &response.parsed_request {
            rows.push(("Provider".into(), parsed.metadata.provider.clone()));
            rows.push(("Confidence".into(), format!("{:.2}", parsed.confidence_score)));
            rows.push(("Absence request".into(), parsed.is_absence_request.to_string()));
        }

        match &response.outcome {
            RunOutcome::Held { proposal, reason } => {
                rows.push(("Employee".into(), proposal.employee_id.to_string()));
                rows.push(("Absence type".into(), proposal.absence_type_id.to_string()));
                rows.push(("Dates".into(), format!("{} to {}", proposal.start_date, proposal.end_date)));
                rows.push(("Working days".into(), proposal.total_days.to_string()));
                rows.push(("Held because".into(), reason.to_string()));
            }
            RunOutcome::Skipped { reason } => rows.push(("Skipped because".into(), reason.to_string())),
            RunOutcome::Malformed { parse_error: Some(e) } => rows.push(("Parse error".into(), e.clone())),
            _ => {}
        }

        if let Some(record) = &response.absence_record {
            rows.push(("Record".into(), record.id.to_string()));
            rows.push(("Dates".into(), format!("{} to {}", record.start_date, record.end_date)));
            rows.push(("Working days".into(), record.total_days.to_string()));
            rows.push(("Status".into(), record.status.as_str().into()));
        }

        if let Some(error) = &response.error {
            rows.push(("Error".into(), error.message.clone()));
        }

        let mut builder = Builder::default();
        for (key, value) in rows {
            builder.push_record([key, value]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());

        format!("{}\n{}", self.outcome_line(&response.outcome), table)
    }

    fn outcome_line(&self, outcome: &RunOutcome) -> String {
        match outcome {
            RunOutcome::Created { record_id } => self.success(&format!("Absence record created: {}", record_id)),
            RunOutcome::Held { .. } => self.warning("Request held for review"),
            RunOutcome::Skipped { .. } => self.info("No absence request to create"),
            RunOutcome::Rejected { reason } => self.error(&format!("Request rejected: {}", reason)),
            RunOutcome::Malformed { .. } => self.warning("Provider answer could not be parsed"),
            RunOutcome::Failed => self.error("No extraction provider available"),
        }
    }

    /// Format processing statistics.
    pub fn stats(&self, stats: &ProcessingStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats.total_processed.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                builder.push_record(["Runs".to_string(), stats.total_processed.to_string()]);
                builder.push_record(["Completed".to_string(), stats.successful_processed.to_string()]);
                builder.push_record(["Failed".to_string(), stats.failed_processed.to_string()]);
                builder.push_record(["Records created".to_string(), stats.auto_created_records.to_string()]);
                builder.push_record(["Success rate".to_string(), format!("{:.1}%", stats.success_rate)]);
                builder.push_record([
                    "Auto-creation rate".to_string(),
                    format!("{:.1}%", stats.auto_creation_rate),
                ]);
                builder.push_record([
                    "Average confidence".to_string(),
                    format!("{:.2}", stats.avg_confidence_score),
                ]);
                builder.push_record(["Tokens".to_string(), stats.total_tokens.to_string()]);
                builder.push_record(["Cost".to_string(), format!("${:.4}", stats.total_cost)]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format absence records.
    pub fn records(&self, records: &[AbsenceRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Quiet => {
                let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
            OutputFormat::Table => Ok(self.records_table(records)),
        }
    }

    /// Format a single record.
    pub fn record(&self, record: &AbsenceRecord) -> Result<String> {
        self.records(std::slice::from_ref(record))
    }

    fn records_table(&self, records: &[AbsenceRecord]) -> String {
        if records.is_empty() {
            return self.colorize("No absence records found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Employee", "Start", "End", "Days", "Status", "Source"]);

        for record in records {
            builder.push_record([
                short_id(&record.id.to_string()),
                short_id(&record.employee_id.to_string()),
                record.start_date.to_string(),
                record.end_date.to_string(),
                record.total_days.to_string(),
                record.status.as_str().to_string(),
                record.source.as_str().to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Leading eight characters of an id, for narrow tables.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
