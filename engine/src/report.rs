//! Structured results of a workspace validation run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use typefiles_core::{Finding, Severity};

/// Findings grouped under one location.
///
/// The location is the validated directory, or the configuration file itself
/// when that file could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryReport {
    pub location: PathBuf,
    pub findings: Vec<Finding>,
}

impl DirectoryReport {
    pub fn new(location: impl Into<PathBuf>, findings: Vec<Finding>) -> Self {
        Self {
            location: location.into(),
            findings,
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }
}

/// Outcome of one full validation pass over a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub root: PathBuf,
    /// RFC 3339 timestamp of when the report was produced.
    pub generated_at: String,
    pub directories_scanned: usize,
    pub directories: Vec<DirectoryReport>,
}

impl ValidationReport {
    pub fn new(root: impl Into<PathBuf>, directories_scanned: usize, directories: Vec<DirectoryReport>) -> Self {
        Self {
            root: root.into(),
            generated_at: Utc::now().to_rfc3339(),
            directories_scanned,
            directories,
        }
    }

    pub fn error_count(&self) -> usize {
        self.directories.iter().map(DirectoryReport::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.directories.iter().map(DirectoryReport::warning_count).sum()
    }

    /// True when no directory produced any finding.
    pub fn is_clean(&self) -> bool {
        self.directories.iter().all(|dir| dir.findings.is_empty())
    }

    /// Iterates every finding in report order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.directories.iter().flat_map(|dir| dir.findings.iter())
    }

    /// Findings reported for `location`, if any.
    pub fn findings_for(&self, location: &Path) -> Option<&[Finding]> {
        self.directories
            .iter()
            .find(|dir| dir.location == location)
            .map(|dir| dir.findings.as_slice())
    }
}
