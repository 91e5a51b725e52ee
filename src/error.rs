//! # Error Types
//!
//! Errors surfaced by the world core. Only configuration problems are hard
//! errors; generation failures are soft and handled by requeueing the chunk.

use std::fmt;

/// Errors raised while loading or validating a [`WorldConfig`](crate::config::WorldConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration text is not valid JSON for the expected shape.
    Parse(serde_json::Error),
    /// A value is outside its documented range.
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "JSON error: {}", e),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Why a chunk generation job did not produce a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// The generator panicked on a worker. Carries the panic message when it
    /// was a string.
    Panicked(String),
    /// The job did not report back within the configured timeout.
    TimedOut,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::Panicked(msg) => write!(f, "generation panicked: {}", msg),
            GenerationFailure::TimedOut => write!(f, "generation timed out"),
        }
    }
}

impl std::error::Error for GenerationFailure {}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
