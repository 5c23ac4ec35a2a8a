//! Error types for settings loading

use casita_core::ButtonId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file
    #[error("failed to read settings file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse settings in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The same button is bound twice
    #[error("button '{button}' is bound more than once")]
    DuplicateButton { button: ButtonId },

    /// A binding field failed validation
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
