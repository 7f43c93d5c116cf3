//! Glob compilation and anchoring helpers shared by the lint and the engine.
//!
//! Patterns follow the usual shell conventions: `*` and `?` never cross a `/`,
//! `**` spans any number of path components. A pattern starting with `./` is
//! relative to the configuration file that declared it; after anchoring it
//! becomes an absolute pattern rooted at that file's directory.

use std::path::Path;

use globset::{Glob, GlobBuilder, GlobMatcher};

/// Prefix marking a pattern as relative to its configuration file.
pub const ANCHOR_PREFIX: &str = "./";

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Builds a [`Glob`] with `/`-aware wildcards.
pub fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

/// Compiles a single pattern into a matcher.
///
/// # Examples
///
/// ```
/// use typefiles_core::compile_pattern;
///
/// let matcher = compile_pattern("src/*.rs").unwrap();
/// assert!(matcher.is_match("src/lib.rs"));
/// assert!(!matcher.is_match("src/bin/main.rs"));
/// assert!(compile_pattern("src/[a-").is_err());
/// ```
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(build_glob(pattern)?.compile_matcher())
}

/// Returns `true` for patterns starting with [`ANCHOR_PREFIX`].
pub fn is_anchored(pattern: &str) -> bool {
    pattern.starts_with(ANCHOR_PREFIX)
}

/// Returns `true` if the pattern contains any glob metacharacter.
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Escapes glob metacharacters so `literal` only matches itself.
pub fn escape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if GLOB_META.contains(&ch) {
            out.push('[');
            out.push(ch);
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrites a `./`-prefixed pattern into an absolute pattern under `dir`.
///
/// Patterns without the prefix are returned unchanged. The directory part is
/// escaped, so metacharacters in real directory names stay literal.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use typefiles_core::anchor_pattern;
///
/// assert_eq!(anchor_pattern("./docs/*.md", Path::new("/repo")), "/repo/docs/*.md");
/// assert_eq!(anchor_pattern("*.md", Path::new("/repo")), "*.md");
/// assert_eq!(anchor_pattern("./a", Path::new("/repo/[x]")), "/repo/[[]x[]]/a");
/// ```
pub fn anchor_pattern(pattern: &str, dir: &Path) -> String {
    match pattern.strip_prefix(ANCHOR_PREFIX) {
        Some(rest) => format!("{}/{}", escape_literal(&dir_string(dir)), rest),
        None => pattern.to_string(),
    }
}

/// Rewrites a `./`-prefixed literal path into an absolute path under `dir`.
pub fn anchor_path(path: &str, dir: &Path) -> String {
    match path.strip_prefix(ANCHOR_PREFIX) {
        Some(rest) => format!("{}/{}", dir_string(dir), rest),
        None => path.to_string(),
    }
}

fn dir_string(dir: &Path) -> String {
    let raw = dir.to_string_lossy().replace('\\', "/");
    raw.trim_end_matches('/').to_string()
}
