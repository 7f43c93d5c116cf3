//! Per-directory validation against an effective schema.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use typefiles_core::{ANCHOR_PREFIX, CONFIG_FILE_NAME, Finding, MatchRule, SchemaFragment};

use crate::error::ValidateError;
use crate::matcher::{FsMatcher, MatchOptions, PatternMatcher};

/// Checks one directory against one schema.
///
/// Validation never fails as a whole: filesystem and pattern problems are
/// reported as findings for the directory being checked.
#[derive(Clone)]
pub struct DirectoryValidator {
    matcher: Arc<dyn PatternMatcher>,
    config_file_name: String,
    include_hidden: bool,
    include_hidden_directories: bool,
}

impl Default for DirectoryValidator {
    fn default() -> Self {
        Self::new(Arc::new(FsMatcher))
    }
}

impl std::fmt::Debug for DirectoryValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryValidator")
            .field("config_file_name", &self.config_file_name)
            .field("include_hidden", &self.include_hidden)
            .field("include_hidden_directories", &self.include_hidden_directories)
            .finish_non_exhaustive()
    }
}

impl DirectoryValidator {
    pub fn new(matcher: Arc<dyn PatternMatcher>) -> Self {
        Self {
            matcher,
            config_file_name: CONFIG_FILE_NAME.to_string(),
            include_hidden: true,
            include_hidden_directories: false,
        }
    }

    /// Sets the reserved configuration file name excluded from every listing.
    pub fn with_config_file_name(mut self, name: impl Into<String>) -> Self {
        self.config_file_name = name.into();
        self
    }

    /// Sets whether dotfiles take part in listings and matches.
    pub fn with_hidden_files(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Sets whether hidden directories can be mirror targets or
    /// `directories` matches.
    pub fn with_hidden_directories(mut self, include_hidden: bool) -> Self {
        self.include_hidden_directories = include_hidden;
        self
    }

    /// Options for expanding directory patterns.
    pub fn directory_options(&self) -> MatchOptions {
        MatchOptions::directories().with_hidden(self.include_hidden_directories)
    }

    pub fn matcher(&self) -> &dyn PatternMatcher {
        self.matcher.as_ref()
    }

    /// Validates `directory` against `schema`.
    ///
    /// Runs, in order: file listing with exclusions, mirror rules, required
    /// patterns, allowed patterns. Each step runs even when an earlier one
    /// produced findings.
    pub fn validate(&self, directory: &Path, schema: &SchemaFragment) -> Vec<Finding> {
        let mut run = Run {
            validator: self,
            directory,
            findings: Vec::new(),
            access_reported: false,
            reported_patterns: HashSet::new(),
        };

        let Some(listed) = run.list_files(directory) else {
            return run.findings;
        };
        let excluded = run.expand_each(directory, schema.exclude_patterns());
        let files = run.without_excluded(listed, &excluded);

        for rule in schema.mirror_rules() {
            run.check_mirror_rule(rule, &files, schema.exclude_patterns());
        }

        let required = run.check_required(schema, &excluded);

        if let Some(patterns) = &schema.patterns {
            let allowed = run.expand_each(directory, patterns);
            for file in &files {
                if !allowed.contains(file) && !required.contains(file) {
                    let message = format!(
                        "File {} doesn't match required patterns",
                        display_relative(file, directory)
                    );
                    run.findings.push(Finding::warning(file, message));
                }
            }
        }

        run.findings
    }

    fn options(&self) -> MatchOptions {
        MatchOptions::files().with_hidden(self.include_hidden)
    }

    fn is_config_file(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name == self.config_file_name.as_str())
    }
}

/// State for a single `validate` call.
struct Run<'a> {
    validator: &'a DirectoryValidator,
    directory: &'a Path,
    findings: Vec<Finding>,
    access_reported: bool,
    /// Malformed patterns already reported; each gets one finding.
    reported_patterns: HashSet<String>,
}

impl Run<'_> {
    /// Lists every file under `base`.
    ///
    /// `None` means the listing failed; the failure has been recorded.
    fn list_files(&mut self, base: &Path) -> Option<Vec<PathBuf>> {
        match self
            .validator
            .matcher
            .list_files(base, self.validator.include_hidden)
        {
            Ok(listed) => Some(listed),
            Err(err) => {
                self.record(err);
                None
            }
        }
    }

    /// Drops excluded and configuration files from a listing.
    fn without_excluded(
        &self,
        listed: Vec<PathBuf>,
        excluded: &BTreeSet<PathBuf>,
    ) -> BTreeSet<PathBuf> {
        listed
            .into_iter()
            .filter(|file| !excluded.contains(file) && !self.validator.is_config_file(file))
            .collect()
    }

    /// Union of the matches of each pattern, failures recorded per pattern.
    fn expand_each(&mut self, base: &Path, patterns: &[String]) -> BTreeSet<PathBuf> {
        let mut union = BTreeSet::new();
        for pattern in patterns {
            match self.matches(base, pattern) {
                Ok(matched) => union.extend(matched),
                Err(err) => self.record(err),
            }
        }
        union
    }

    fn matches(&self, base: &Path, pattern: &str) -> Result<BTreeSet<PathBuf>, ValidateError> {
        self.validator.matcher.matches(
            base,
            std::slice::from_ref(&pattern.to_string()),
            self.validator.options(),
        )
    }

    fn check_required(
        &mut self,
        schema: &SchemaFragment,
        excluded: &BTreeSet<PathBuf>,
    ) -> BTreeSet<PathBuf> {
        let mut union = BTreeSet::new();
        for pattern in schema.required_patterns() {
            let matched = match self.matches(self.directory, pattern) {
                Ok(matched) => matched,
                Err(err) => {
                    self.record(err);
                    continue;
                }
            };
            let kept: Vec<_> = matched
                .into_iter()
                .filter(|file| !excluded.contains(file) && !self.validator.is_config_file(file))
                .collect();
            if kept.is_empty() {
                self.findings.push(Finding::error(
                    self.directory,
                    format!("Missing required file matching pattern: {pattern}"),
                ));
            }
            union.extend(kept);
        }
        union
    }

    /// Checks one mirror rule against the validated directory.
    ///
    /// Unanchored `schemaDirectory` and `targetDirectories` are resolved
    /// against the validated directory's parent, where its siblings live.
    fn check_mirror_rule(&mut self, rule: &MatchRule, files: &BTreeSet<PathBuf>, exclude: &[String]) {
        let Some(parent) = self.directory.parent() else {
            return;
        };
        let base = resolve_rule_path(&rule.schema_directory, parent);
        if base.parent() != Some(parent) || base == self.directory {
            return;
        }

        let targets = match self.validator.matcher.matches(
            parent,
            std::slice::from_ref(&rule.target_directories),
            self.validator.directory_options(),
        ) {
            Ok(targets) => targets,
            Err(err) => {
                self.record(err);
                return;
            }
        };
        if !targets.contains(self.directory) {
            return;
        }

        let base_files = if base.is_dir() {
            let Some(listed) = self.list_files(&base) else {
                return;
            };
            let excluded = self.expand_each(&base, exclude);
            self.without_excluded(listed, &excluded)
        } else {
            BTreeSet::new()
        };
        let base_names = file_names(&base_files);
        if base_names.is_empty() {
            self.findings.push(Finding::error(
                self.directory,
                format!("Base directory has no files: {}", base.display()),
            ));
            return;
        }

        let present = file_names(files);
        for name in base_names.difference(&present) {
            self.findings.push(Finding::error(
                self.directory,
                format!("Missing file: {name} in {}", self.directory.display()),
            ));
        }
    }

    /// Records a matcher failure as a finding.
    ///
    /// Access failures collapse into one finding per directory.
    fn record(&mut self, err: ValidateError) {
        match err {
            ValidateError::Access { path, source } => {
                warn!(path = %path.display(), error = %source, "filesystem access failed");
                if !self.access_reported {
                    self.access_reported = true;
                    self.findings.push(Finding::error(
                        self.directory,
                        format!("Error accessing directory: {}", self.directory.display()),
                    ));
                }
            }
            ValidateError::Pattern { pattern, reason } => {
                if !self.reported_patterns.insert(pattern.clone()) {
                    return;
                }
                self.findings.push(Finding::error(
                    self.directory,
                    format!("Invalid pattern {pattern}: {reason}"),
                ));
            }
        }
    }
}

/// Resolves a mirror rule path. Anchored paths are already absolute;
/// the rest are taken relative to the validated directory's parent.
fn resolve_rule_path(path: &str, parent: &Path) -> PathBuf {
    let path = path.strip_prefix(ANCHOR_PREFIX).unwrap_or(path);
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        parent.join(path)
    }
}

fn file_names(files: &BTreeSet<PathBuf>) -> BTreeSet<String> {
    files
        .iter()
        .filter_map(|file| file.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

fn display_relative(file: &Path, directory: &Path) -> String {
    file.strip_prefix(directory)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use typefiles_core::Severity;

    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn test_required_pattern_without_match_is_one_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.ts");
        let schema = SchemaFragment::new().with_required(["index.ts", "README.md"]);

        let findings = DirectoryValidator::default().validate(dir.path(), &schema);
        assert_eq!(messages(&findings), ["Missing required file matching pattern: README.md"]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].path, dir.path());
    }

    #[test]
    fn test_files_outside_allowed_patterns_warn() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.ts");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "styles.css");
        let schema = SchemaFragment::new()
            .with_required(["index.ts"])
            .with_patterns(["*.css"]);

        let findings = DirectoryValidator::default().validate(dir.path(), &schema);
        assert_eq!(messages(&findings), ["File notes.txt doesn't match required patterns"]);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].path, dir.path().join("notes.txt"));
    }

    #[test]
    fn test_without_patterns_any_file_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "anything.bin");
        let schema = SchemaFragment::new().with_required(["*.bin"]);

        assert!(DirectoryValidator::default().validate(dir.path(), &schema).is_empty());
    }

    #[test]
    fn test_excluded_and_config_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE_NAME);
        touch(dir.path(), "sub/tfconfig.json");
        touch(dir.path(), "generated/out.js");
        touch(dir.path(), "main.rs");
        let schema = SchemaFragment::new()
            .with_patterns(["*.rs"])
            .with_exclude(["generated/**"]);

        assert!(DirectoryValidator::default().validate(dir.path(), &schema).is_empty());
    }

    #[test]
    fn test_excluded_file_does_not_satisfy_required() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "legacy.ts");
        let schema = SchemaFragment::new()
            .with_required(["*.ts"])
            .with_exclude(["legacy.ts"]);

        let findings = DirectoryValidator::default().validate(dir.path(), &schema);
        assert_eq!(messages(&findings), ["Missing required file matching pattern: *.ts"]);
    }

    #[test]
    fn test_mirror_rule_reports_missing_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        touch(&root, "locales/en/x.json");
        touch(&root, "locales/en/y.json");
        touch(&root, "locales/fr/x.json");
        let schema = SchemaFragment::new().with_match_rule(MatchRule::new("en", "*"));

        let validator = DirectoryValidator::default();
        let fr = root.join("locales/fr");
        let findings = validator.validate(&fr, &schema);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            format!("Missing file: y.json in {}", fr.display())
        );

        // the base directory never checks against itself
        assert!(validator.validate(&root.join("locales/en"), &schema).is_empty());
    }

    #[test]
    fn test_mirror_rule_with_empty_base() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("en")).unwrap();
        touch(&root, "fr/x.json");
        let schema = SchemaFragment::new().with_match_rule(MatchRule::new("en", "fr"));

        let findings = DirectoryValidator::default().validate(&root.join("fr"), &schema);
        assert_eq!(
            messages(&findings),
            [format!("Base directory has no files: {}", root.join("en").display()).as_str()]
        );
    }

    #[test]
    fn test_unreadable_directory_is_one_access_finding() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        let schema = SchemaFragment::new().with_required(["a", "b"]);

        let findings = DirectoryValidator::default().validate(&gone, &schema);
        assert_eq!(
            messages(&findings),
            [format!("Error accessing directory: {}", gone.display()).as_str()]
        );
    }

    #[test]
    fn test_invalid_pattern_is_localized() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.ts");
        let schema = SchemaFragment::new().with_required(["index.ts", "[z-"]);

        let findings = DirectoryValidator::default().validate(dir.path(), &schema);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Invalid pattern [z-"));
    }

    #[test]
    fn test_invalid_exclude_pattern_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        let schema = SchemaFragment::new()
            .with_required(["a.txt"])
            .with_exclude(["[z-"]);

        let findings = DirectoryValidator::default().validate(dir.path(), &schema);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Invalid pattern [z-"));
    }

    #[test]
    fn test_invalid_exclude_pattern_is_reported_once_with_mirror_rule() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        touch(&root, "en/x.json");
        touch(&root, "fr/x.json");
        let schema = SchemaFragment::new()
            .with_exclude(["[z-"])
            .with_match_rule(MatchRule::new("en", "*"));

        let findings = DirectoryValidator::default().validate(&root.join("fr"), &schema);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Invalid pattern [z-"));
    }

    #[test]
    fn test_hidden_mirror_targets_follow_setting() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        touch(&root, "en/x.json");
        fs::create_dir_all(root.join(".fr")).unwrap();
        let schema = SchemaFragment::new().with_match_rule(MatchRule::new("en", "*"));
        let hidden = root.join(".fr");

        assert!(DirectoryValidator::default().validate(&hidden, &schema).is_empty());

        let findings = DirectoryValidator::default()
            .with_hidden_directories(true)
            .validate(&hidden, &schema);
        assert_eq!(
            messages(&findings),
            [format!("Missing file: x.json in {}", hidden.display()).as_str()]
        );
    }
}
