//! Loading and validation of `config.json`.
//!
//! The file lives next to the stage executables and is read once per run.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the configuration inside the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0} must be non-empty")]
    MissingField(&'static str),
}

/// Credentials for the document extraction service.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtractionService {
    #[serde(rename = "APIKey", default)]
    pub api_key: String,
    #[serde(rename = "Template", default)]
    pub template: String,
}

/// Taxpayer identity and registration codes passed to the stages.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "TIN")]
    pub tin: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "VAT")]
    pub vat: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Environment")]
    pub environment: String,
    #[serde(rename = "BusinUnitCode")]
    pub business_unit_code: String,
    #[serde(rename = "TCRCode")]
    pub tcr_code: String,
    #[serde(rename = "SoftCode")]
    pub software_code: String,
    #[serde(rename = "OperatorCode")]
    pub operator_code: String,
    #[serde(rename = "Typless")]
    pub extraction: ExtractionService,
}

impl Config {
    /// Fields every stage run depends on, in the order they are checked.
    fn required_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("TIN", &self.tin),
            ("Name", &self.name),
            ("VAT", &self.vat),
            ("BusinUnitCode", &self.business_unit_code),
            ("TCRCode", &self.tcr_code),
            ("SoftCode", &self.software_code),
            ("OperatorCode", &self.operator_code),
        ]
    }
}

/// Return the config path for a working directory.
pub fn config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CONFIG_FILE_NAME)
}

/// Parse a config document without validating it.
pub fn parse_config(path: &Path, bytes: &[u8]) -> Result<Config, ConfigError> {
    serde_json::from_slice(bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, parse, and validate `config.json` from the working directory.
pub fn load_config(work_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(work_dir);
    let bytes = fs::read(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&path, &bytes)?;
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Reject configs with any required field empty or whitespace-only.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, value) in config.required_fields() {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(name));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
