//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("config parse error: {message}")]
    ParseError { message: String },

    #[error("invalid config value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
