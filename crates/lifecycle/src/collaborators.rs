//! External collaborator interfaces
//!
//! The engine never touches archives, compilers, or the file system
//! itself; those concerns live behind these traits. Retry policy also
//! belongs to the collaborator - the orchestrator reports the first
//! failure and moves on.

use std::path::PathBuf;

use async_trait::async_trait;

use mason_errors::Error;
use mason_resolver::ResolvedNode;

use crate::descriptor::CapabilityDescriptor;

/// Handle to an extracted, patched source tree.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
}

impl SourceTree {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Handle to compiled build output.
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    pub root: PathBuf,
}

impl BuildArtifacts {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Handle to an installed package tree, stripped of generator metadata
/// not meant for consumers.
#[derive(Debug, Clone)]
pub struct PackageTree {
    pub root: PathBuf,
}

impl PackageTree {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Downloads, extracts, and patches a package's sources.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the source tree for a resolved node, applying any
    /// recipe-declared patches.
    async fn fetch(&self, node: &ResolvedNode) -> Result<SourceTree, Error>;
}

/// Drives the native build toolchain.
#[async_trait]
pub trait ToolchainRunner: Send + Sync {
    /// Generate toolchain input (build files, dependency metadata) from
    /// the descriptors of already-packaged dependencies.
    async fn generate(
        &self,
        node: &ResolvedNode,
        source: &SourceTree,
        dependencies: &[CapabilityDescriptor],
    ) -> Result<(), Error>;

    /// Configure and compile the package.
    async fn build(
        &self,
        node: &ResolvedNode,
        source: &SourceTree,
    ) -> Result<BuildArtifacts, Error>;
}

/// Installs build artifacts into a consumable package tree.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(
        &self,
        node: &ResolvedNode,
        artifacts: BuildArtifacts,
    ) -> Result<PackageTree, Error>;
}
