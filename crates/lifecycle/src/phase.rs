//! Lifecycle phase state machine
//!
//! Phases are strictly ordered and cannot be skipped: a node moves
//! through every phase in sequence or stops where it failed.

use serde::{Deserialize, Serialize};
use std::fmt;

use mason_errors::LifecycleError;

/// Ordered lifecycle phases of one resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Configured,
    RequirementsResolved,
    Validated,
    BuildRequirementsResolved,
    Sourced,
    Generated,
    Built,
    Packaged,
    Described,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 9] = [
        Phase::Configured,
        Phase::RequirementsResolved,
        Phase::Validated,
        Phase::BuildRequirementsResolved,
        Phase::Sourced,
        Phase::Generated,
        Phase::Built,
        Phase::Packaged,
        Phase::Described,
    ];

    /// The phase that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        let index = Phase::ALL.iter().position(|p| *p == self)?;
        Phase::ALL.get(index + 1).copied()
    }

    /// Whether this phase delegates to an external collaborator.
    #[must_use]
    pub fn is_external(self) -> bool {
        matches!(self, Phase::Sourced | Phase::Built | Phase::Packaged)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configured => "configure",
            Phase::RequirementsResolved => "requirements",
            Phase::Validated => "validate",
            Phase::BuildRequirementsResolved => "build-requirements",
            Phase::Sourced => "source",
            Phase::Generated => "generate",
            Phase::Built => "build",
            Phase::Packaged => "package",
            Phase::Described => "package-info",
        };
        write!(f, "{name}")
    }
}

/// Tracks one node's progress and enforces the no-skipping rule.
#[derive(Debug, Clone)]
pub struct PhaseSequence {
    package: String,
    current: Option<Phase>,
}

impl PhaseSequence {
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            current: None,
        }
    }

    /// Start a sequence that already completed resolution-time phases.
    #[must_use]
    pub fn starting_at(package: impl Into<String>, phase: Phase) -> Self {
        Self {
            package: package.into(),
            current: Some(phase),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    /// Advance to the given phase.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::PhaseOrder` when `to` is not the
    /// immediate successor of the current phase.
    pub fn advance_to(&mut self, to: Phase) -> Result<(), LifecycleError> {
        let expected = match self.current {
            None => Phase::Configured,
            Some(current) => current.next().ok_or_else(|| LifecycleError::PhaseOrder {
                package: self.package.clone(),
                from: current.to_string(),
                to: to.to_string(),
            })?,
        };

        if to != expected {
            return Err(LifecycleError::PhaseOrder {
                package: self.package.clone(),
                from: self
                    .current
                    .map_or_else(|| "start".to_string(), |p| p.to_string()),
                to: to.to_string(),
            });
        }

        self.current = Some(to);
        Ok(())
    }
}
