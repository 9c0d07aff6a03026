//! Configuration management for the CLI.
//!
//! The file holds the output settings and the full pipeline configuration:
//!
//! ```toml
//! [settings]
//! color = true
//! format = "table"
//!
//! [pipeline]
//! database_path = "/home/me/.absentia/absentia.db"
//!
//! [pipeline.gate]
//! confidence_threshold = 0.8
//! ```

use crate::error::{CliError, Result};
use absentia_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (ids only)
    Quiet,
}

impl Config {
    /// Default configuration file path (`~/.absentia/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".absentia").join("config.toml"))
    }

    /// Load configuration, writing the defaults on first use.
    ///
    /// A relative `database_path` is resolved against the config file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.pipeline.validate()?;
            config
        } else {
            let config = Self::default();
            config.save(path)?;
            config
        };

        if config.pipeline.database_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.pipeline.database_path = dir.join(&config.pipeline.database_path);
            }
        }
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
