#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the mason build engine
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone where possible for easier handling.

use thiserror::Error;

pub mod config;
pub mod lifecycle;
pub mod recipe;
pub mod resolve;
pub mod version;

// Re-export all error types at the root
pub use config::ConfigError;
pub use lifecycle::LifecycleError;
pub use recipe::RecipeError;
pub use resolve::ResolveError;
pub use version::VersionError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for analytics / structured reporting.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::Version(_) => "error.version",
            Error::Recipe(err) => err.code(),
            Error::Resolve(err) => err.code(),
            Error::Config(_) => "error.config",
            Error::Lifecycle(err) => err.code(),
            Error::Internal(_) => "error.internal",
            Error::Cancelled => "error.cancelled",
            Error::Io { .. } => "error.io",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<semver::Error> for Error {
    fn from(err: semver::Error) -> Self {
        Self::Version(VersionError::ParseError {
            message: err.to_string(),
        })
    }
}

/// Result type alias for mason operations
pub type Result<T> = std::result::Result<T, Error>;
