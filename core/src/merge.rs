//! Fragment merging and anchoring.
//!
//! Fragments collected from a directory's ancestors are folded farther to
//! closer with [`merge_fragments`]. List fields are unioned, `directories`
//! is a shallow overlay where the closer key wins, and the origin of the
//! closer fragment is kept.
//!
//! # Example
//!
//! ```
//! use typefiles_core::*;
//!
//! let root = SchemaFragment::new()
//!     .with_required(["README.md"])
//!     .with_directory("pkg/*", SchemaFragment::new().with_required(["index.ts"]));
//! let child = SchemaFragment::new()
//!     .with_required(["README.md", "LICENSE"])
//!     .with_directory("pkg/*", SchemaFragment::new().with_required(["main.ts"]));
//!
//! let merged = merge_fragments(&root, &child);
//! assert_eq!(merged.required_patterns(), ["README.md", "LICENSE"]);
//! let directories = merged.directories.unwrap();
//! let pkg = &directories["pkg/*"];
//! assert_eq!(pkg.required_patterns(), ["main.ts"]);
//! ```

use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;

use crate::pattern::{anchor_path, anchor_pattern};
use crate::{MatchRule, SchemaFragment};

/// Merges `closer` on top of `farther`.
///
/// The operation is associative, so folding a root-to-leaf chain pairwise
/// gives the same result as any other grouping that keeps the order.
pub fn merge_fragments(farther: &SchemaFragment, closer: &SchemaFragment) -> SchemaFragment {
    let directories = match (&farther.directories, &closer.directories) {
        (None, None) => None,
        (Some(far), None) => Some(far.clone()),
        (None, Some(near)) => Some(near.clone()),
        (Some(far), Some(near)) => {
            let mut merged = far.clone();
            merged.extend(near.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
    };

    SchemaFragment {
        required: union(&farther.required, &closer.required),
        patterns: union(&farther.patterns, &closer.patterns),
        exclude: union(&farther.exclude, &closer.exclude),
        directories,
        match_rules: union(&farther.match_rules, &closer.match_rules),
        origin: closer.origin.clone().or_else(|| farther.origin.clone()),
    }
}

/// Folds a farther-to-closer chain into one effective schema.
///
/// Returns `None` for an empty chain.
///
/// # Examples
///
/// ```
/// use typefiles_core::*;
///
/// let chain = vec![
///     SchemaFragment::new().with_patterns(["*.md"]).with_origin("/repo/tfconfig.json"),
///     SchemaFragment::new().with_patterns(["*.rs"]).with_origin("/repo/src/tfconfig.json"),
/// ];
/// let merged = merge_chain(&chain).unwrap();
/// assert_eq!(merged.patterns.as_deref().unwrap(), ["*.md", "*.rs"]);
/// assert_eq!(merged.origin.unwrap().to_str(), Some("/repo/src/tfconfig.json"));
///
/// assert!(merge_chain(&Vec::<SchemaFragment>::new()).is_none());
/// ```
pub fn merge_chain<'a, I>(chain: I) -> Option<SchemaFragment>
where
    I: IntoIterator<Item = &'a SchemaFragment>,
{
    let mut iter = chain.into_iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |merged, next| merge_fragments(&merged, next)))
}

/// Rewrites every `./`-prefixed entry of `fragment` to be rooted at `dir`.
///
/// Applies to `required`, `patterns`, `exclude` and both fields of each
/// mirror rule. Inline `directories` fragments are left alone: they are
/// evaluated relative to the subdirectory they select.
pub fn anchor_fragment(fragment: &SchemaFragment, dir: &Path) -> SchemaFragment {
    let anchor_all = |patterns: &Option<Vec<String>>| -> Option<Vec<String>> {
        patterns
            .as_ref()
            .map(|list| list.iter().map(|p| anchor_pattern(p, dir)).collect())
    };

    SchemaFragment {
        required: anchor_all(&fragment.required),
        patterns: anchor_all(&fragment.patterns),
        exclude: anchor_all(&fragment.exclude),
        directories: fragment.directories.clone(),
        match_rules: fragment.match_rules.as_ref().map(|rules| {
            rules
                .iter()
                .map(|rule| MatchRule {
                    schema_directory: anchor_path(&rule.schema_directory, dir),
                    target_directories: anchor_pattern(&rule.target_directories, dir),
                })
                .collect()
        }),
        origin: fragment.origin.clone(),
    }
}

fn union<T>(farther: &Option<Vec<T>>, closer: &Option<Vec<T>>) -> Option<Vec<T>>
where
    T: Clone + Eq + Hash,
{
    if farther.is_none() && closer.is_none() {
        return None;
    }

    let mut seen = HashSet::new();
    let merged = farther
        .iter()
        .chain(closer.iter())
        .flatten()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect();
    Some(merged)
}
