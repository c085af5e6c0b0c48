#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build lifecycle orchestration for mason
//!
//! Sequences the fixed multi-phase lifecycle over a resolved graph,
//! delegating source retrieval, toolchain invocation, and installation
//! to external collaborators, and emits a capability descriptor for
//! every packaged node.

pub mod collaborators;
pub mod descriptor;
pub mod orchestrator;
pub mod phase;

pub use collaborators::{
    BuildArtifacts, Installer, PackageTree, SourceFetcher, SourceTree, ToolchainRunner,
};
pub use descriptor::{describe, CapabilityDescriptor};
pub use orchestrator::Orchestrator;
pub use phase::{Phase, PhaseSequence};
