//! Absentia CLI - operator entry point of the absence request pipeline.

use absentia_cli::commands;
use absentia_cli::{Cli, Command, Config, Formatter};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);
    let pipeline = &config.pipeline;

    match cli.command {
        Command::Process(args) => commands::execute_process(args, pipeline, &formatter)
            .await
            .context("Processing failed")?,
        Command::Stats(args) => commands::execute_stats(args, pipeline, &formatter)?,
        Command::Feedback(args) => commands::execute_feedback(args, pipeline, &formatter)?,
        Command::ImportRoster(args) => {
            let file = args.file.clone();
            commands::execute_import_roster(args, pipeline, &formatter)
                .with_context(|| format!("Failed to import roster from {}", file))?
        }
        Command::RemoveType(args) => commands::execute_remove_type(args, pipeline, &formatter)?,
        Command::Records(args) => commands::execute_records(args, pipeline, &formatter)?,
        Command::Approve(args) => commands::execute_approve(args, pipeline, &formatter)?,
        Command::Reject(args) => commands::execute_reject(args, pipeline, &formatter)?,
        Command::Cancel(args) => commands::execute_cancel(args, pipeline, &formatter)?,
    }

    Ok(())
}
