//! Whole-workspace validation runs.
//!
//! The orchestrator enumerates every directory under the workspace root,
//! resolves each one's effective schema and validates it. Directories are
//! processed in parallel with `rayon`; results keep enumeration order so an
//! unchanged tree always yields the same report.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use typefiles_config::{ConfigLoader, EngineSettings};
use typefiles_core::{Finding, SchemaFragment};
use walkdir::WalkDir;

use crate::error::{EngineError, Result, ValidateError};
use crate::expander::{ExpandedTarget, expand_with_options};
use crate::matcher::{FsMatcher, PatternMatcher};
use crate::report::{DirectoryReport, ValidationReport};
use crate::resolver::SchemaResolver;
use crate::validator::DirectoryValidator;

/// Runs validation passes over a workspace.
///
/// The configuration cache lives as long as the orchestrator, so repeated
/// runs only re-read configuration files that changed.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    settings: EngineSettings,
    resolver: SchemaResolver,
    validator: DirectoryValidator,
}

/// What one enumerated directory contributed to the report.
#[derive(Default)]
struct DirectoryOutcome {
    reports: Vec<DirectoryReport>,
    config_error: Option<(PathBuf, String)>,
}

impl Orchestrator {
    pub fn new(settings: EngineSettings) -> Self {
        let loader = ConfigLoader::with_file_name(settings.config_file_name.clone());
        let validator = DirectoryValidator::new(Arc::new(FsMatcher))
            .with_config_file_name(settings.config_file_name.clone())
            .with_hidden_files(settings.include_hidden_files)
            .with_hidden_directories(settings.scan_hidden_directories);
        Self {
            resolver: SchemaResolver::new(Arc::new(loader)),
            validator,
            settings,
        }
    }

    /// Replaces the filesystem collaborator used for pattern expansion.
    pub fn with_matcher(mut self, matcher: Arc<dyn PatternMatcher>) -> Self {
        self.validator = DirectoryValidator::new(matcher)
            .with_config_file_name(self.settings.config_file_name.clone())
            .with_hidden_files(self.settings.include_hidden_files)
            .with_hidden_directories(self.settings.scan_hidden_directories);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Lists the directories to validate, root first, in file-name order.
    ///
    /// Hidden and ignored directories are pruned with their whole subtree.
    /// A directory that cannot be read below the root is still returned so
    /// that validation reports the access failure.
    ///
    /// # Errors
    ///
    /// [`EngineError::WorkspaceEnumeration`] if the root itself cannot be
    /// resolved or read.
    pub fn enumerate_directories(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root
            .canonicalize()
            .map_err(|source| EngineError::WorkspaceEnumeration {
                root: root.to_path_buf(),
                source,
            })?;
        if !root.is_dir() {
            return Err(EngineError::WorkspaceEnumeration {
                source: std::io::Error::other("not a directory"),
                root,
            });
        }

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self
                        .settings
                        .is_ignored_directory(&entry.file_name().to_string_lossy())
            });

        let mut directories = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => directories.push(entry.into_path()),
                Ok(_) => {}
                Err(err) if err.depth() == 0 => {
                    return Err(EngineError::WorkspaceEnumeration {
                        root,
                        source: err.into(),
                    });
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    if let Some(path) = err.path() {
                        if directories.last().is_none_or(|last| last != path) && path.is_dir() {
                            directories.push(path.to_path_buf());
                        }
                    }
                }
            }
        }
        Ok(directories)
    }

    /// Validates every directory under `root`.
    ///
    /// # Errors
    ///
    /// Fails only when the workspace cannot be enumerated or the worker pool
    /// cannot be built; per-directory problems are findings in the report.
    pub fn run(&self, root: &Path) -> Result<ValidationReport> {
        let directories = self.enumerate_directories(root)?;
        let Some(root) = directories.first().cloned() else {
            return Ok(ValidationReport::new(root, 0, Vec::new()));
        };
        info!(root = %root.display(), directories = directories.len(), "validating workspace");

        let outcomes: Vec<DirectoryOutcome> = match self.settings.jobs.filter(|jobs| *jobs > 0) {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
                pool.install(|| self.check_all(&directories, &root))
            }
            None => self.check_all(&directories, &root),
        };

        let mut reported_configs = HashSet::new();
        let mut reports = Vec::new();
        for outcome in outcomes {
            reports.extend(outcome.reports);
            if let Some((path, message)) = outcome.config_error {
                if reported_configs.insert(path.clone()) {
                    reports.push(DirectoryReport::new(&path, vec![Finding::error(&path, message)]));
                }
            }
        }

        let report = ValidationReport::new(root, directories.len(), reports);
        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation finished"
        );
        Ok(report)
    }

    fn check_all(&self, directories: &[PathBuf], root: &Path) -> Vec<DirectoryOutcome> {
        directories
            .par_iter()
            .map(|directory| self.check_directory(directory, root))
            .collect()
    }

    fn check_directory(&self, directory: &Path, root: &Path) -> DirectoryOutcome {
        let mut outcome = DirectoryOutcome::default();
        let schema = match self.resolver.resolve(directory, root) {
            Ok(Some(schema)) => schema,
            Ok(None) => return outcome,
            Err(err) => {
                warn!(directory = %directory.display(), error = %err, "configuration failed to load");
                let path = err.path().unwrap_or(directory).to_path_buf();
                outcome.config_error = Some((path, err.to_string()));
                return outcome;
            }
        };

        debug!(directory = %directory.display(), "validating directory");
        let mut findings = self.validator.validate(directory, &schema);
        let targets = self.expand_targets(directory, &schema, &mut findings);
        if !findings.is_empty() {
            outcome.reports.push(DirectoryReport::new(directory, findings));
        }

        for target in targets {
            let findings = self.validator.validate(&target.directory, &target.schema);
            if !findings.is_empty() {
                outcome.reports.push(DirectoryReport::new(target.directory, findings));
            }
        }
        outcome
    }

    fn expand_targets(
        &self,
        directory: &Path,
        schema: &SchemaFragment,
        findings: &mut Vec<Finding>,
    ) -> Vec<ExpandedTarget> {
        if schema.directories.is_none() {
            return Vec::new();
        }
        let expansion = expand_with_options(
            directory,
            schema,
            self.validator.matcher(),
            self.validator.directory_options(),
        );
        for failure in expansion.failures {
            let message = match failure.error {
                ValidateError::Pattern { reason, .. } => {
                    format!("Invalid pattern {}: {reason}", failure.pattern)
                }
                ValidateError::Access { .. } => {
                    format!("Error accessing directory: {}", directory.display())
                }
            };
            findings.push(Finding::error(directory, message));
        }
        expansion.targets
    }
}

/// Validates the workspace at `root` with default settings.
///
/// # Examples
///
/// ```no_run
/// let report = typefiles_engine::validate_workspace("path/to/workspace").unwrap();
/// for finding in report.findings() {
///     println!("{finding}");
/// }
/// ```
pub fn validate_workspace(root: impl AsRef<Path>) -> Result<ValidationReport> {
    Orchestrator::new(EngineSettings::default()).run(root.as_ref())
}
