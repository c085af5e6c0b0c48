//! Version parsing and constraint error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("version parse error: {message}")]
    ParseError { message: String },

    #[error("invalid version constraint: {input}")]
    InvalidConstraint { input: String },

    #[error("empty package spec")]
    EmptySpec,
}
