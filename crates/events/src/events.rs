//! Domain-driven event definitions
//!
//! Events are grouped by the subsystem that produces them. Every variant
//! carries enough data to be rendered or logged without further lookups.

use crate::meta::{EventLevel, EventMeta, EventSource};
use mason_types::PackageId;
use serde::{Deserialize, Serialize};

/// Top-level event type carried on the channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum AppEvent {
    Resolver(ResolverEvent),
    Lifecycle(LifecycleEvent),
    General(GeneralEvent),
}

impl AppEvent {
    /// Build the metadata that accompanies this event when routed to
    /// tracing.
    #[must_use]
    pub fn meta(&self) -> EventMeta {
        match self {
            AppEvent::Resolver(event) => EventMeta::new(event.level(), EventSource::Resolver),
            AppEvent::Lifecycle(event) => EventMeta::new(event.level(), EventSource::Lifecycle),
            AppEvent::General(event) => EventMeta::new(event.level(), EventSource::General),
        }
    }
}

/// Events emitted during graph resolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverEvent {
    ResolutionStarted {
        root: String,
    },
    PackageResolved {
        package: PackageId,
    },
    /// A force-flagged requirement overrode a previously chosen version.
    VersionOverridden {
        name: String,
        previous: String,
        chosen: String,
        forced_by: String,
    },
    ResolutionCompleted {
        packages: usize,
    },
    ValidationFailed {
        package: String,
        message: String,
    },
}

impl ResolverEvent {
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            ResolverEvent::ResolutionStarted { .. }
            | ResolverEvent::PackageResolved { .. }
            | ResolverEvent::ResolutionCompleted { .. } => EventLevel::Info,
            ResolverEvent::VersionOverridden { .. } => EventLevel::Warn,
            ResolverEvent::ValidationFailed { .. } => EventLevel::Error,
        }
    }
}

/// Events emitted while executing lifecycle phases.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEvent {
    PhaseStarted {
        package: String,
        phase: String,
    },
    PhaseCompleted {
        package: String,
        phase: String,
    },
    PhaseFailed {
        package: String,
        phase: String,
        error: String,
    },
    /// A dependent was never attempted because a dependency failed.
    PackageSkipped {
        package: String,
        failed_dependency: String,
    },
    DescriptorEmitted {
        package: PackageId,
    },
}

impl LifecycleEvent {
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            LifecycleEvent::PhaseStarted { .. } | LifecycleEvent::PhaseCompleted { .. } => {
                EventLevel::Debug
            }
            LifecycleEvent::DescriptorEmitted { .. } => EventLevel::Info,
            LifecycleEvent::PackageSkipped { .. } => EventLevel::Warn,
            LifecycleEvent::PhaseFailed { .. } => EventLevel::Error,
        }
    }
}

/// Cross-cutting events not tied to a single subsystem.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneralEvent {
    Debug {
        message: String,
    },
    Warning {
        message: String,
        context: Option<String>,
    },
    Error {
        message: String,
        details: Option<String>,
    },
    OperationStarted {
        operation: String,
    },
    OperationCompleted {
        operation: String,
        success: bool,
    },
}

impl GeneralEvent {
    pub fn debug(message: impl Into<String>) -> Self {
        Self::Debug {
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            GeneralEvent::Debug { .. } => EventLevel::Debug,
            GeneralEvent::OperationStarted { .. } | GeneralEvent::OperationCompleted { .. } => {
                EventLevel::Info
            }
            GeneralEvent::Warning { .. } => EventLevel::Warn,
            GeneralEvent::Error { .. } => EventLevel::Error,
        }
    }
}
