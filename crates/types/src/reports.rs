//! Report type definitions for build runs

use crate::PackageId;
use serde::{Deserialize, Serialize};

/// A package whose lifecycle failed, with the phase it failed in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedPackage {
    pub name: String,
    pub phase: String,
    pub error: String,
}

/// Summary of one orchestrated build run.
///
/// Skipped packages are dependents of a failed package; they were never
/// attempted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BuildReport {
    /// Packages that reached the final phase, in completion order
    pub described: Vec<PackageId>,
    /// Packages whose lifecycle failed
    pub failed: Vec<FailedPackage>,
    /// Dependents skipped because a dependency failed
    pub skipped: Vec<String>,
    /// Total execution time
    pub duration_ms: u64,
}

impl BuildReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    #[test]
    fn test_report_success() {
        let mut report = BuildReport::default();
        assert!(report.is_success());

        report.described.push(PackageId::new(
            "zlib",
            Version::parse("1.3.1").unwrap(),
        ));
        assert!(report.is_success());

        report.skipped.push("curl".to_string());
        assert!(!report.is_success());
    }
}
