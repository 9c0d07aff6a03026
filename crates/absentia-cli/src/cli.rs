//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Absentia CLI - turn absence emails into leave records.
#[derive(Debug, Parser)]
#[command(name = "absentia")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.absentia/config.toml)
    #[arg(short, long, global = true, env = "ABSENTIA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one email through the pipeline
    Process(ProcessArgs),

    /// Show processing statistics of a tenant
    Stats(StatsArgs),

    /// Record reviewer feedback on a processing run
    Feedback(FeedbackArgs),

    /// Import employees and absence types from a JSON file
    ImportRoster(ImportRosterArgs),

    /// Delete an absence type, or deactivate it when records use it
    RemoveType(RemoveTypeArgs),

    /// List the absence records of a tenant
    Records(StatsArgs),

    /// Approve a pending absence record
    Approve(ApproveArgs),

    /// Reject a pending absence record
    Reject(RejectArgs),

    /// Cancel a pending or approved absence record
    Cancel(CancelArgs),
}

/// Arguments for the process command.
#[derive(Debug, Parser)]
pub struct ProcessArgs {
    /// Tenant id
    #[arg(short, long)]
    pub tenant: String,

    /// Email subject
    #[arg(short, long)]
    pub subject: String,

    /// Sender address
    #[arg(long)]
    pub sender: String,

    /// Email body
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the body from a file (stdin when neither is given)
    #[arg(long)]
    pub body_file: Option<String>,

    /// Only propose a record, never create one
    #[arg(long)]
    pub no_auto_create: bool,
}

/// Arguments for tenant-scoped listings.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Tenant id
    #[arg(short, long)]
    pub tenant: String,
}

/// Arguments for the feedback command.
#[derive(Debug, Parser)]
pub struct FeedbackArgs {
    /// Processing log id
    pub log_id: String,

    /// Mark the extraction as wrong
    #[arg(long)]
    pub incorrect: bool,

    /// Corrected fields as a JSON object
    #[arg(long)]
    pub corrections: Option<String>,

    /// Free-text comment
    #[arg(long)]
    pub comments: Option<String>,
}

/// Arguments for the import-roster command.
#[derive(Debug, Parser)]
pub struct ImportRosterArgs {
    /// JSON roster file
    pub file: String,
}

/// Arguments for the remove-type command.
#[derive(Debug, Parser)]
pub struct RemoveTypeArgs {
    /// Absence type id
    pub id: String,
}

/// Arguments for the approve command.
#[derive(Debug, Parser)]
pub struct ApproveArgs {
    /// Absence record id
    pub id: String,

    /// Approver
    #[arg(long = "by")]
    pub approver: String,
}

/// Arguments for the reject command.
#[derive(Debug, Parser)]
pub struct RejectArgs {
    /// Absence record id
    pub id: String,

    /// Reviewer
    #[arg(long = "by")]
    pub reviewer: String,

    /// Reason given to the employee
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Arguments for the cancel command.
#[derive(Debug, Parser)]
pub struct CancelArgs {
    /// Absence record id
    pub id: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
