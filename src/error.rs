//! Structured error types for configuration loading and resolution.

use crate::format::ConfigFormat;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error classes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The configuration could not be read, parsed, or bound. Aborts startup.
    ConfigurationLoad,
    /// A required entity cannot be resolved from the loaded configuration.
    Configuration,
    /// A value supplied as an override is malformed.
    Validation,
}

/// Errors raised while loading or querying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't load configuration file {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't load configuration file {}: file is empty", .path.display())]
    EmptySource { path: PathBuf },

    #[error("unsupported configuration format `{0}`")]
    UnsupportedFormat(String),

    #[error("can't parse {format} configuration: {message}")]
    Parse {
        format: ConfigFormat,
        message: String,
    },

    #[error("can't bind configuration: {0}")]
    Bind(#[from] serde_json::Error),

    #[error("invalid override for `{key}`: {reason}")]
    InvalidOverlay { key: String, reason: String },

    #[error("can't find any plugins for operation `{operation}`")]
    NoPlugins { operation: String },

    #[error("database with id `{id}` can not be found or has an invalid type")]
    DatabaseNotFound { id: String },

    #[error("there is no database configuration available")]
    NoDatabase,

    #[error("can't convert `{value}` to boolean")]
    InvalidBoolean { value: String },
}

impl ConfigError {
    pub fn parse(format: ConfigFormat, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }

    pub fn invalid_overlay(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOverlay {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// The error class this error belongs to.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Load { .. }
            | ConfigError::EmptySource { .. }
            | ConfigError::UnsupportedFormat(_)
            | ConfigError::Parse { .. }
            | ConfigError::Bind(_) => ErrorCode::ConfigurationLoad,
            ConfigError::NoPlugins { .. }
            | ConfigError::DatabaseNotFound { .. }
            | ConfigError::NoDatabase => ErrorCode::Configuration,
            ConfigError::InvalidOverlay { .. } | ConfigError::InvalidBoolean { .. } => {
                ErrorCode::Validation
            }
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
