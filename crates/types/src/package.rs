//! Package identity and requirement specification types

use crate::{Version, VersionSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a resolved package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub version: Version,
}

impl PackageId {
    /// Create a new package ID
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Package requirement with optional version constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version_spec: VersionSpec,
}

impl PackageSpec {
    /// Parse a package spec from a string (e.g., `"zlib>=1.2,<2.0"`)
    ///
    /// # Errors
    ///
    /// Returns `VersionError` if the name is empty or a constraint is
    /// malformed.
    pub fn parse(s: &str) -> Result<Self, mason_errors::VersionError> {
        // The name runs up to the first constraint operator, if any.
        let split_pos = s
            .char_indices()
            .find(|&(_, c)| matches!(c, '=' | '>' | '<' | '!' | '~'))
            .map(|(pos, _)| pos);

        let (name, version_str) = match split_pos {
            Some(pos) => (s[..pos].trim(), s[pos..].trim()),
            None => (s.trim(), "*"),
        };

        if name.is_empty() {
            return Err(mason_errors::VersionError::EmptySpec);
        }

        Ok(Self {
            name: name.to_string(),
            version_spec: version_str.parse()?,
        })
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_spec.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}", self.name, self.version_spec)
        }
    }
}

/// Dependency kind
///
/// Build requirements are tools consumed only while building; they never
/// enter the installable dependency graph or exposed capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    Runtime,
    Build,
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Build => write!(f, "build"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_spec_parse() {
        let spec = PackageSpec::parse("zlib>=1.2.11").unwrap();
        assert_eq!(spec.name, "zlib");
        assert_eq!(spec.version_spec.to_string(), ">=1.2.11");

        let spec = PackageSpec::parse("curl").unwrap();
        assert_eq!(spec.name, "curl");
        assert!(spec.version_spec.is_any());

        let spec = PackageSpec::parse("openssl>=1.1.0,<2.0.0").unwrap();
        assert_eq!(spec.name, "openssl");
        assert_eq!(spec.version_spec.to_string(), ">=1.1.0,<2.0.0");
    }

    #[test]
    fn test_package_spec_rejects_empty_name() {
        assert!(PackageSpec::parse(">=1.0.0").is_err());
        assert!(PackageSpec::parse("   ").is_err());
    }

    #[test]
    fn test_package_id_display() {
        let id = PackageId::new("coin-clp", Version::parse("1.17.7").unwrap());
        assert_eq!(id.to_string(), "coin-clp/1.17.7");
    }
}
