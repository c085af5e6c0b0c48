//! Dependency graph resolution error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolveError {
    /// A forced override left a previously satisfied requirement unsatisfied.
    #[error(
        "version conflict on {name}: {requirer} requires {constraint}, \
         but {chosen} was forced by {forced_by}"
    )]
    VersionConflict {
        name: String,
        requirer: String,
        constraint: String,
        chosen: String,
        forced_by: String,
    },

    /// Two non-force requirements on the same name disagree.
    #[error(
        "unresolvable version conflict on {name}: {first_requirer} requires \
         {first_constraint}, {second_requirer} requires {second_constraint}"
    )]
    UnresolvableVersionConflict {
        name: String,
        first_requirer: String,
        first_constraint: String,
        second_requirer: String,
        second_constraint: String,
    },

    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("dependency graph is not a DAG")]
    NotADag,
}

impl ResolveError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::VersionConflict { .. } => "resolve.version_conflict",
            ResolveError::UnresolvableVersionConflict { .. } => {
                "resolve.unresolvable_version_conflict"
            }
            ResolveError::CyclicDependency { .. } => "resolve.cyclic_dependency",
            ResolveError::NotADag => "resolve.not_a_dag",
        }
    }
}
