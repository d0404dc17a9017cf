//! Configuration loading and representation.
//!
//! Defaults, then the TOML file named by `SHAREFAIR_CONFIG` (if any), then
//! individual environment overrides.

use std::path::Path;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use sharefair_expense::DEFAULT_DATE_FORMAT;
use sharefair_observability::{LogFormat, LogSettings};

pub const CONFIG_PATH_ENV: &str = "SHAREFAIR_CONFIG";
pub const LOG_FILTER_ENV: &str = "SHAREFAIR_LOG_FILTER";
pub const LOG_FORMAT_ENV: &str = "SHAREFAIR_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareFairConfig {
    pub log: LogSettings,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// strftime pattern for the date column of exported rows.
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ShareFairConfig {
    /// Load from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.log.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            self.log.format = format
                .parse::<LogFormat>()
                .with_context(|| format!("Invalid {LOG_FORMAT_ENV} value: {format}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        sharefair_expense::export::validate_date_format(&self.export.date_format)
            .map_err(|e| anyhow!("export.date_format: {e}"))?;
        if self.log.filter.trim().is_empty() {
            return Err(anyhow!("log.filter must not be empty"));
        }
        Ok(())
    }
}
