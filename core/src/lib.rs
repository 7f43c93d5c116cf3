//! Core schema types for directory file-presence validation.
//!
//! This crate defines the data model shared by the loader, the engine and the
//! CLI:
//!
//! - [`SchemaFragment`]: rules declared by one `tfconfig.json` file
//!   (required patterns, allowed patterns, exclusions, inline directory
//!   rules, mirror rules).
//! - [`MatchRule`]: a mirror rule between sibling directories.
//! - [`Finding`] / [`Severity`]: one validation outcome.
//!
//! Merging ([`merge_fragments`], [`merge_chain`]) folds ancestor fragments into
//! an effective schema, closest-wins. Anchoring ([`anchor_fragment`]) pins
//! `./`-prefixed entries to the directory of the file that declared them.
//! Linting ([`lint_fragment`]) catches malformed globs before validation.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use typefiles_core::*;
//!
//! let root: SchemaFragment = serde_json::from_str(r#"{ "required": ["./README.md"] }"#).unwrap();
//! let root = anchor_fragment(&root, Path::new("/repo"));
//! let leaf = SchemaFragment::new().with_patterns(["*.rs"]);
//!
//! let effective = merge_chain([&root, &leaf]).unwrap();
//! assert_eq!(effective.required_patterns(), ["/repo/README.md"]);
//! assert!(lint_fragment(&effective).is_empty());
//! ```

mod merge;
mod pattern;
mod types;
mod validate;

pub use merge::{anchor_fragment, merge_chain, merge_fragments};
pub use pattern::{
    ANCHOR_PREFIX, anchor_path, anchor_pattern, build_glob, compile_pattern, escape_literal,
    has_glob_meta, is_anchored,
};
pub use types::*;
pub use validate::{LintError, lint_fragment};
