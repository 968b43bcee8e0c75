//! Errors raised while loading or validating dashboard settings

use std::path::PathBuf;

use flaunch_dash_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` names a file that does not exist
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),

    /// A file without a known extension could not be read to detect its format
    #[error("Could not read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unknown chain key or malformed manager address
    #[error("Invalid network settings: {0}")]
    Network(#[from] CoreError),

    #[error("Invalid {section} settings: {reason}")]
    InvalidSection {
        section: &'static str,
        reason: String,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Layering or deserializing the merged sources failed
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub(crate) fn invalid(section: &'static str, reason: impl ToString) -> Self {
        ConfigError::InvalidSection {
            section,
            reason: reason.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
