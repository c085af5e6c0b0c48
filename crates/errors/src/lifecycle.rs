//! Build lifecycle error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum LifecycleError {
    #[error("source fetch failed for {package}: {message}")]
    SourceFetchFailed { package: String, message: String },

    #[error("external tool failed for {package} during {phase}: {message}")]
    ExternalToolFailed {
        package: String,
        phase: String,
        message: String,
    },

    /// Configuration rejected by recipe validation rules before any build
    /// phase ran.
    #[error("configuration rejected: {} validation failure(s)", failures.len())]
    ValidationRejected { failures: Vec<String> },

    #[error("phase order violation for {package}: {from} -> {to}")]
    PhaseOrder {
        package: String,
        from: String,
        to: String,
    },

    #[error("dependency {dependency} of {package} failed; package skipped")]
    DependencyFailed {
        package: String,
        dependency: String,
    },
}

impl LifecycleError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::SourceFetchFailed { .. } => "lifecycle.source_fetch_failed",
            LifecycleError::ExternalToolFailed { .. } => "lifecycle.external_tool_failed",
            LifecycleError::ValidationRejected { .. } => "lifecycle.validation_rejected",
            LifecycleError::PhaseOrder { .. } => "lifecycle.phase_order",
            LifecycleError::DependencyFailed { .. } => "lifecycle.dependency_failed",
        }
    }
}
