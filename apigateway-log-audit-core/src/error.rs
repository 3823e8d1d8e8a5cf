//! Error types returned before an audit run starts.
//!
//! Everything that happens during a run is reported as a [`crate::Diagnostic`]
//! instead; these errors only cover loading and validating the configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::aws::AwsError;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config file extension for '{0}' (expected .toml or .json)")]
    UnsupportedConfigFormat(PathBuf),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Aws(#[from] AwsError),
}

impl AuditError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
