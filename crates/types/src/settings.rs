//! Global build-target settings
//!
//! Settings are cross-cutting target parameters (OS, architecture,
//! compiler, build type) shared by every recipe in one resolution. A
//! recipe reads them; it never defines them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known settings keys
pub const OS: &str = "os";
pub const ARCH: &str = "arch";
pub const COMPILER: &str = "compiler";
pub const BUILD_TYPE: &str = "build_type";

/// Ordered map of target settings. BTreeMap keeps iteration order stable
/// so resolution stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder-style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check a key against an expected value; absent keys never match.
    #[must_use]
    pub fn is(&self, key: &str, expected: &str) -> bool {
        self.get(key) == Some(expected)
    }

    #[must_use]
    pub fn os(&self) -> Option<&str> {
        self.get(OS)
    }

    #[must_use]
    pub fn arch(&self) -> Option<&str> {
        self.get(ARCH)
    }

    #[must_use]
    pub fn compiler(&self) -> Option<&str> {
        self.get(COMPILER)
    }

    #[must_use]
    pub fn build_type(&self) -> Option<&str> {
        self.get(BUILD_TYPE)
    }

    /// Project the subset of settings a recipe declares it consumes.
    /// Keys the target does not define are simply absent from the result.
    #[must_use]
    pub fn project<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = Self::new();
        for key in keys {
            if let Some(value) = self.values.get(key) {
                out.values.insert(key.to_string(), value.clone());
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl FromIterator<(String, String)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Settings {
        Settings::new()
            .with(OS, "linux")
            .with(ARCH, "x86_64")
            .with(COMPILER, "gcc")
            .with(BUILD_TYPE, "Release")
    }

    #[test]
    fn test_accessors() {
        let settings = target();
        assert_eq!(settings.os(), Some("linux"));
        assert_eq!(settings.arch(), Some("x86_64"));
        assert!(settings.is(COMPILER, "gcc"));
        assert!(!settings.is(COMPILER, "msvc"));
        assert!(!settings.is("nonexistent", "anything"));
    }

    #[test]
    fn test_projection() {
        let settings = target();
        let projected = settings.project([OS, BUILD_TYPE, "missing"]);
        assert_eq!(projected.os(), Some("linux"));
        assert_eq!(projected.build_type(), Some("Release"));
        assert_eq!(projected.get(ARCH), None);
        assert_eq!(projected.get("missing"), None);
    }

    #[test]
    fn test_display_is_ordered() {
        let settings = Settings::new().with("b", "2").with("a", "1");
        assert_eq!(settings.to_string(), "a=1, b=2");
    }
}
