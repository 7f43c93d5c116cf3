//! Schema type definitions for directory file-presence rules.
//!
//! A [`SchemaFragment`] is the content of one configuration file. Fragments
//! from a directory and its ancestors are folded into an effective schema
//! (see [`merge_fragments`](crate::merge_fragments)), which is itself just a
//! `SchemaFragment` with its origin set to the closest configuration file.
//!
//! Validation outcomes are reported as [`Finding`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reserved name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = "tfconfig.json";

/// Mirror rule: every file name found under `schema_directory` must also exist
/// under each directory matched by `target_directories`.
///
/// # Examples
///
/// ```
/// use typefiles_core::MatchRule;
///
/// let rule: MatchRule = serde_json::from_str(
///     r#"{ "schemaDirectory": "./en", "targetDirectories": "./*" }"#,
/// ).unwrap();
/// assert_eq!(rule.schema_directory, "./en");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchRule {
    /// Directory holding the canonical file set.
    pub schema_directory: String,
    /// Glob selecting the directories that must mirror it.
    pub target_directories: String,
}

impl MatchRule {
    pub fn new(schema_directory: &str, target_directories: &str) -> Self {
        Self {
            schema_directory: schema_directory.to_string(),
            target_directories: target_directories.to_string(),
        }
    }
}

/// Rules declared by a single configuration file.
///
/// Every list field is optional. `None` means "no constraint of that kind";
/// `Some(vec![])` is a real (if unusual) constraint, e.g. an empty `patterns`
/// list allows only files matched by `required`.
///
/// # Examples
///
/// ```
/// use typefiles_core::SchemaFragment;
///
/// let fragment: SchemaFragment = serde_json::from_str(r#"{
///     "required": ["README.md"],
///     "patterns": ["*.ts"],
///     "directories": { "flavors/*": { "required": ["index.ts"] } }
/// }"#).unwrap();
///
/// assert_eq!(fragment.required.as_deref(), Some(&["README.md".to_string()][..]));
/// assert!(fragment.exclude.is_none());
/// assert!(fragment.directories.unwrap().contains_key("flavors/*"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaFragment {
    /// Patterns that must each match at least one file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Patterns describing the complete allowed-file set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    /// Patterns removed from consideration before any check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Inline fragments applied to subdirectories matched by each key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<BTreeMap<String, SchemaFragment>>,
    /// Mirror rules between sibling directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_rules: Option<Vec<MatchRule>>,
    /// Configuration file this fragment was loaded from.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl SchemaFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds an inline fragment for subdirectories matching `pattern`.
    pub fn with_directory(mut self, pattern: &str, fragment: SchemaFragment) -> Self {
        self.directories
            .get_or_insert_with(BTreeMap::new)
            .insert(pattern.to_string(), fragment);
        self
    }

    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.match_rules.get_or_insert_with(Vec::new).push(rule);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Directory containing the configuration file this fragment came from.
    pub fn origin_dir(&self) -> Option<&Path> {
        self.origin.as_deref().and_then(Path::parent)
    }

    /// Returns `true` when the fragment declares no rule of any kind.
    pub fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.patterns.is_none()
            && self.exclude.is_none()
            && self.directories.is_none()
            && self.match_rules.is_none()
    }

    pub fn required_patterns(&self) -> &[String] {
        self.required.as_deref().unwrap_or_default()
    }

    pub fn exclude_patterns(&self) -> &[String] {
        self.exclude.as_deref().unwrap_or_default()
    }

    pub fn mirror_rules(&self) -> &[MatchRule] {
        self.match_rules.as_deref().unwrap_or_default()
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// One validation outcome tied to a directory or file.
///
/// # Examples
///
/// ```
/// use typefiles_core::{Finding, Severity};
///
/// let finding = Finding::error("/repo/src", "Missing required file matching pattern: lib.rs");
/// assert_eq!(finding.severity, Severity::Error);
/// assert!(finding.is_error());
/// assert_eq!(
///     finding.to_string(),
///     "error: Missing required file matching pattern: lib.rs (/repo/src)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub path: PathBuf,
}

impl Finding {
    pub fn error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn warning(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.message, self.path.display())
    }
}
