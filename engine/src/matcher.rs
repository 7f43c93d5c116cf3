//! Pattern expansion against the filesystem.
//!
//! The engine never walks the filesystem directly; it goes through a
//! [`PatternMatcher`]. [`FsMatcher`] is the default implementation backed by
//! `walkdir` and `globset`.
//!
//! Relative patterns are matched against paths relative to the base
//! directory. Absolute patterns (produced by anchoring `./` entries) are
//! matched against absolute paths and walked from their longest literal
//! prefix. Results are always absolute paths.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use typefiles_core::{ANCHOR_PREFIX, compile_pattern, has_glob_meta};
use walkdir::{DirEntry, WalkDir};

use crate::error::ValidateError;

/// Kind of filesystem entry a match may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Options for one expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub kind: EntryKind,
    /// Whether entries whose name starts with `.` can match or be descended into.
    pub include_hidden: bool,
}

impl MatchOptions {
    /// Files, dotfiles included.
    pub fn files() -> Self {
        Self {
            kind: EntryKind::File,
            include_hidden: true,
        }
    }

    /// Directories, hidden ones skipped.
    pub fn directories() -> Self {
        Self {
            kind: EntryKind::Directory,
            include_hidden: false,
        }
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }
}

/// Filesystem collaborator used by the resolver, expander and validator.
pub trait PatternMatcher: Send + Sync {
    /// Returns every entry under `base` matching at least one pattern.
    fn matches(
        &self,
        base: &Path,
        patterns: &[String],
        options: MatchOptions,
    ) -> Result<BTreeSet<PathBuf>, ValidateError>;

    /// Lists every file under `base`, recursively.
    fn list_files(&self, base: &Path, include_hidden: bool) -> Result<Vec<PathBuf>, ValidateError>;
}

/// [`PatternMatcher`] over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMatcher;

impl PatternMatcher for FsMatcher {
    fn matches(
        &self,
        base: &Path,
        patterns: &[String],
        options: MatchOptions,
    ) -> Result<BTreeSet<PathBuf>, ValidateError> {
        let mut found = BTreeSet::new();
        for pattern in patterns {
            let pattern = pattern.strip_prefix(ANCHOR_PREFIX).unwrap_or(pattern);
            if Path::new(pattern).is_absolute() {
                expand_absolute(pattern, options, &mut found)?;
            } else {
                expand_relative(base, pattern, options, &mut found)?;
            }
        }
        Ok(found)
    }

    fn list_files(&self, base: &Path, include_hidden: bool) -> Result<Vec<PathBuf>, ValidateError> {
        let mut files = Vec::new();
        for entry in walker(base, usize::MAX, include_hidden) {
            let entry = entry.map_err(|err| ValidateError::from_walk(base, err))?;
            if entry_is(&entry, EntryKind::File) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

fn expand_relative(
    base: &Path,
    pattern: &str,
    options: MatchOptions,
    found: &mut BTreeSet<PathBuf>,
) -> Result<(), ValidateError> {
    let matcher = compile_pattern(pattern).map_err(|err| ValidateError::pattern(pattern, &err))?;
    for entry in walker(base, walk_depth(pattern), options.include_hidden) {
        let entry = entry.map_err(|err| ValidateError::from_walk(base, err))?;
        if !entry_is(&entry, options.kind) {
            continue;
        }
        let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
        if matcher.is_match(relative) {
            found.insert(entry.into_path());
        }
    }
    Ok(())
}

fn expand_absolute(
    pattern: &str,
    options: MatchOptions,
    found: &mut BTreeSet<PathBuf>,
) -> Result<(), ValidateError> {
    let matcher = compile_pattern(pattern).map_err(|err| ValidateError::pattern(pattern, &err))?;

    if !has_glob_meta(pattern) {
        let path = PathBuf::from(pattern);
        let kind_ok = match options.kind {
            EntryKind::File => path.is_file(),
            EntryKind::Directory => path.is_dir(),
        };
        if kind_ok {
            found.insert(path);
        }
        return Ok(());
    }

    let (root, rest) = literal_root(pattern);
    // An anchor that no longer exists simply matches nothing.
    if !root.is_dir() {
        return Ok(());
    }
    for entry in walker(&root, walk_depth(&rest), options.include_hidden) {
        let entry = entry.map_err(|err| ValidateError::from_walk(&root, err))?;
        if entry_is(&entry, options.kind) && matcher.is_match(entry.path()) {
            found.insert(entry.into_path());
        }
    }
    Ok(())
}

/// Splits an absolute pattern into the directory made of its leading literal
/// components and the remaining pattern text.
fn literal_root(pattern: &str) -> (PathBuf, String) {
    let mut root = PathBuf::new();
    let mut rest = Vec::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) if rest.is_empty() && !has_glob_meta(&part.to_string_lossy()) => {
                root.push(part);
            }
            Component::Normal(part) => rest.push(part.to_string_lossy().into_owned()),
            other => root.push(other.as_os_str()),
        }
    }
    (root, rest.join("/"))
}

/// Deepest level a pattern can reach below its base, in path components.
fn walk_depth(pattern: &str) -> usize {
    if pattern.contains("**") {
        usize::MAX
    } else {
        pattern.split('/').filter(|part| !part.is_empty()).count()
    }
}

fn walker(
    base: &Path,
    max_depth: usize,
    include_hidden: bool,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(base)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| include_hidden || entry.depth() == 0 || !is_hidden(entry))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn entry_is(entry: &DirEntry, kind: EntryKind) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return match kind {
            EntryKind::File => entry.path().is_file(),
            EntryKind::Directory => entry.path().is_dir(),
        };
    }
    match kind {
        EntryKind::File => file_type.is_file(),
        EntryKind::Directory => file_type.is_dir(),
    }
}
