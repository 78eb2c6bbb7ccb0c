use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::DEFAULT_DELIMITER;

pub const DEFAULT_DATA_FILE: &str = "./data/elyra.txt";

/// Runtime settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where tasks are loaded from and saved to.
    pub data_file: PathBuf,

    /// Field separator for the task file. Its trimmed text is banned from input.
    pub delimiter: String,

    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            delimiter: DEFAULT_DELIMITER.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.delimiter.trim().is_empty() {
            return Err(ConfigError::BlankDelimiter);
        }
        if self.delimiter.contains('\n') || self.delimiter.contains('\r') {
            return Err(ConfigError::DelimiterLineBreak);
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataFile);
        }
        Ok(())
    }
}
