//! Expansion of a schema's `directories` map into concrete targets.

use std::path::{Path, PathBuf};

use tracing::debug;
use typefiles_core::{ANCHOR_PREFIX, SchemaFragment, merge_fragments};

use crate::error::ValidateError;
use crate::matcher::{MatchOptions, PatternMatcher};

/// A subdirectory selected by a `directories` entry, with the schema it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTarget {
    pub directory: PathBuf,
    pub schema: SchemaFragment,
    /// The `directories` key that selected this target.
    pub pattern: String,
}

/// A `directories` entry that could not be expanded.
#[derive(Debug)]
pub struct ExpansionFailure {
    pub pattern: String,
    pub error: ValidateError,
}

/// Result of [`expand`].
#[derive(Debug, Default)]
pub struct Expansion {
    pub targets: Vec<ExpandedTarget>,
    pub failures: Vec<ExpansionFailure>,
}

/// Expands every `directories` entry of `schema` against `directory`.
///
/// Each matched subdirectory receives `merge(schema, nested)`. Only one level
/// is expanded: `directories` inside the nested fragment are carried into the
/// target schema but not expanded again here. Hidden directories never match;
/// see [`expand_with_options`].
pub fn expand(directory: &Path, schema: &SchemaFragment, matcher: &dyn PatternMatcher) -> Expansion {
    expand_with_options(directory, schema, matcher, MatchOptions::directories())
}

/// [`expand`] with explicit match options for the directory patterns.
pub fn expand_with_options(
    directory: &Path,
    schema: &SchemaFragment,
    matcher: &dyn PatternMatcher,
    options: MatchOptions,
) -> Expansion {
    let mut expansion = Expansion::default();
    let Some(directories) = &schema.directories else {
        return expansion;
    };

    for (sub_pattern, nested) in directories {
        let pattern = sub_pattern
            .strip_prefix(ANCHOR_PREFIX)
            .unwrap_or(sub_pattern)
            .to_string();
        let matched = match matcher.matches(directory, std::slice::from_ref(&pattern), options) {
            Ok(matched) => matched,
            Err(error) => {
                expansion.failures.push(ExpansionFailure {
                    pattern: sub_pattern.clone(),
                    error,
                });
                continue;
            }
        };

        debug!(
            directory = %directory.display(),
            pattern = %sub_pattern,
            matches = matched.len(),
            "expanded directories entry"
        );
        let child = merge_fragments(schema, nested);
        expansion
            .targets
            .extend(matched.into_iter().map(|target| ExpandedTarget {
                directory: target,
                schema: child.clone(),
                pattern: sub_pattern.clone(),
            }));
    }

    expansion
}
