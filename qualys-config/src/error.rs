//! Configuration errors.

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a [`QualysConfig`](crate::QualysConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A configured value could not be interpreted.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Environment key or field name that carried the value.
        key: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl ConfigError {
    /// Convenience constructor for invalid values.
    #[must_use]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
