use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::database::models::TermFilter;
use crate::database::repository::MAX_SQL_PARAMETERS;
use crate::tbx::ExportOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Import defaults
    #[serde(default)]
    pub import: ImportConfig,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Database location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DatabaseConfig {
    /// Path of the SQLite file, the user data directory when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Settings applied when importing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImportConfig {
    /// Source language of glossaries created without an explicit one
    #[serde(default = "default_source_language")]
    pub default_source_language: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_source_language: default_source_language(),
        }
    }
}

/// Settings applied when exporting
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    /// Concepts loaded per page, bounded by the SQLite parameter limit
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Include definitions that are not finalized
    #[serde(default)]
    pub all_definitions: bool,

    /// Which terms are written, by administrative status
    #[serde(default)]
    pub term_filter: TermFilter,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            all_definitions: false,
            term_filter: TermFilter::default(),
        }
    }
}

impl ExportConfig {
    /// Export options seeded from these defaults
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions {
            all_definitions: self.all_definitions,
            term_filter: self.term_filter,
            batch_size: self.batch_size,
            ..ExportOptions::default()
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_batch_size() -> usize {
    MAX_SQL_PARAMETERS
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.export.batch_size == 0 || self.export.batch_size > MAX_SQL_PARAMETERS {
            return Err(anyhow!(
                "Export batch size must be between 1 and {}, got {}",
                MAX_SQL_PARAMETERS,
                self.export.batch_size
            ));
        }

        crate::language_utils::validate_language_code(&self.import.default_source_language)
            .context("Invalid default source language")?;

        Ok(())
    }

    /// Load the configuration, writing a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if config_path.exists() {
            let file = File::open(config_path)
                .with_context(|| format!("Failed to open config file: {:?}", config_path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", config_path))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            import: ImportConfig::default(),
            export: ExportConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
