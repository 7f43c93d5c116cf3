//! Schema resolution and directory validation for typefiles.
//!
//! Given a workspace root, the engine finds every `tfconfig.json` file,
//! resolves the effective schema of each directory from the configuration
//! files on its ancestor chain, and checks the directory's contents against
//! it.
//!
//! # Main entry points
//!
//! - [`validate_workspace`] validates a workspace with default settings.
//! - [`Orchestrator`] runs validation with explicit [`EngineSettings`] and
//!   keeps its configuration cache across runs.
//! - [`SchemaResolver`] and [`DirectoryValidator`] expose the individual
//!   steps for tools that only need part of the pipeline.
//!
//! # Example
//!
//! ```
//! use std::fs;
//!
//! let dir = tempfile::tempdir().unwrap();
//! fs::write(dir.path().join("tfconfig.json"), r#"{ "required": ["README.md"] }"#).unwrap();
//!
//! let report = typefiles_engine::validate_workspace(dir.path()).unwrap();
//! assert_eq!(report.error_count(), 1);
//! assert_eq!(
//!     report.directories[0].findings[0].message,
//!     "Missing required file matching pattern: README.md"
//! );
//! ```
//!
//! [`EngineSettings`]: typefiles_config::EngineSettings

pub mod error;
pub mod expander;
pub mod matcher;
pub mod orchestrator;
pub mod output;
pub mod report;
pub mod resolver;
pub mod validator;

pub use error::{EngineError, Result, ValidateError};
pub use expander::{ExpandedTarget, Expansion, ExpansionFailure, expand, expand_with_options};
pub use matcher::{EntryKind, FsMatcher, MatchOptions, PatternMatcher};
pub use orchestrator::{Orchestrator, validate_workspace};
pub use output::{OutputFormat, format_report, format_schema};
pub use report::{DirectoryReport, ValidationReport};
pub use resolver::SchemaResolver;
pub use validator::DirectoryValidator;
