//! Structural lint for schema fragments.
//!
//! Catches problems that would otherwise only surface while a directory is
//! being validated: malformed globs, empty or duplicated entries, and mirror
//! rules pointing at a glob instead of a directory.
//!
//! # Examples
//!
//! ```
//! use typefiles_core::*;
//!
//! let good = SchemaFragment::new().with_required(["README.md"]);
//! assert!(lint_fragment(&good).is_empty());
//!
//! let bad = SchemaFragment::new().with_patterns(["src/[a-"]);
//! assert!(matches!(
//!     lint_fragment(&bad).as_slice(),
//!     [LintError::InvalidPattern { .. }]
//! ));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::pattern::{compile_pattern, has_glob_meta};
use crate::SchemaFragment;

/// Fragment lint errors.
///
/// `field` is a dotted path into the fragment, e.g. `required` or
/// `directories["flavors/*"].patterns`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    /// Pattern string is empty or whitespace-only.
    #[error("{field}: pattern cannot be empty")]
    EmptyPattern { field: String },
    /// Pattern is not a valid glob.
    #[error("{field}: invalid glob {pattern:?}: {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },
    /// Same pattern listed twice in one field.
    #[error("{field}: duplicate pattern {pattern:?}")]
    DuplicatePattern { field: String, pattern: String },
    /// Mirror rule with an empty side.
    #[error("{field}: mirror rule needs both schemaDirectory and targetDirectories")]
    IncompleteMatchRule { field: String },
    /// Mirror base is a glob rather than one directory.
    #[error("{field}: schemaDirectory must be a plain path, got {path:?}")]
    GlobSchemaDirectory { field: String, path: String },
}

/// Lints a fragment and every inline fragment under `directories`.
pub fn lint_fragment(fragment: &SchemaFragment) -> Vec<LintError> {
    let mut errors = Vec::new();
    lint_into(fragment, "", &mut errors);
    errors
}

fn lint_into(fragment: &SchemaFragment, prefix: &str, errors: &mut Vec<LintError>) {
    let field = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    };

    if let Some(required) = &fragment.required {
        lint_patterns(required, &field("required"), errors);
    }
    if let Some(patterns) = &fragment.patterns {
        lint_patterns(patterns, &field("patterns"), errors);
    }
    if let Some(exclude) = &fragment.exclude {
        lint_patterns(exclude, &field("exclude"), errors);
    }

    for (index, rule) in fragment.mirror_rules().iter().enumerate() {
        let rule_field = field(&format!("matchRules[{index}]"));
        if rule.schema_directory.trim().is_empty() || rule.target_directories.trim().is_empty() {
            errors.push(LintError::IncompleteMatchRule { field: rule_field });
            continue;
        }
        if has_glob_meta(&rule.schema_directory) {
            errors.push(LintError::GlobSchemaDirectory {
                field: rule_field.clone(),
                path: rule.schema_directory.clone(),
            });
        }
        lint_pattern(&rule.target_directories, &rule_field, errors);
    }

    if let Some(directories) = &fragment.directories {
        for (pattern, nested) in directories {
            let nested_field = field(&format!("directories[{pattern:?}]"));
            lint_pattern(pattern, &nested_field, errors);
            lint_into(nested, &nested_field, errors);
        }
    }
}

fn lint_patterns(patterns: &[String], field: &str, errors: &mut Vec<LintError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for pattern in patterns {
        if !seen.insert(pattern.as_str()) {
            errors.push(LintError::DuplicatePattern {
                field: field.to_string(),
                pattern: pattern.clone(),
            });
            continue;
        }
        lint_pattern(pattern, field, errors);
    }
}

fn lint_pattern(pattern: &str, field: &str, errors: &mut Vec<LintError>) {
    if pattern.trim().is_empty() {
        errors.push(LintError::EmptyPattern {
            field: field.to_string(),
        });
        return;
    }
    if let Err(err) = compile_pattern(pattern) {
        errors.push(LintError::InvalidPattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            reason: err.kind().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::MatchRule;

    use super::*;

    #[test]
    fn test_lint_accepts_valid_fragment() {
        let fragment = SchemaFragment::new()
            .with_required(["README.md", "src/**/*.rs"])
            .with_patterns(["*.{md,toml}"])
            .with_match_rule(MatchRule::new("./en", "./*"))
            .with_directory("crates/*", SchemaFragment::new().with_required(["Cargo.toml"]));
        assert!(lint_fragment(&fragment).is_empty());
    }

    #[test]
    fn test_lint_reports_duplicates_and_empties() {
        let fragment = SchemaFragment::new().with_required(["a", "a", " "]);
        assert_eq!(
            lint_fragment(&fragment),
            vec![
                LintError::DuplicatePattern {
                    field: "required".to_string(),
                    pattern: "a".to_string(),
                },
                LintError::EmptyPattern {
                    field: "required".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_lint_descends_into_directories() {
        let fragment = SchemaFragment::new().with_directory(
            "pkg/*",
            SchemaFragment::new().with_exclude(["{unclosed"]),
        );
        let errors = lint_fragment(&fragment);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .starts_with(r#"directories["pkg/*"].exclude: invalid glob"#));
    }

    #[test]
    fn test_lint_rejects_glob_schema_directory() {
        let fragment = SchemaFragment::new()
            .with_match_rule(MatchRule::new("locales/*", "locales/*"))
            .with_match_rule(MatchRule::new("", "x"));
        assert_eq!(
            lint_fragment(&fragment),
            vec![
                LintError::GlobSchemaDirectory {
                    field: "matchRules[0]".to_string(),
                    path: "locales/*".to_string(),
                },
                LintError::IncompleteMatchRule {
                    field: "matchRules[1]".to_string(),
                },
            ]
        );
    }
}
