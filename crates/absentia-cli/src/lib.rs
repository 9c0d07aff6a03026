//! Absentia CLI library.
//!
//! Command parsing, configuration and output formatting for the `absentia`
//! binary. Every command runs against the SQLite database named in the
//! pipeline configuration.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
