//! Configuration loading for typefiles.
//!
//! This crate reads the per-directory `tfconfig.json` files and the optional
//! YAML engine settings file:
//!
//! - [`ConfigLoader`] parses configuration files into
//!   [`SchemaFragment`](typefiles_core::SchemaFragment)s and caches them by
//!   path, invalidating on modification time.
//! - [`EngineSettings`] controls workspace scanning (reserved file name,
//!   ignored directories, hidden entries, parallelism).
//!
//! # Quick start
//!
//! ```no_run
//! use typefiles_config::{ConfigLoader, EngineSettings};
//!
//! let settings = EngineSettings::load("typefiles.yml").unwrap_or_default();
//! let loader = ConfigLoader::with_file_name(settings.config_file_name.clone());
//! let fragment = loader.load_dir("packages/app".as_ref()).unwrap();
//! println!("has rules: {}", fragment.is_some());
//! ```

mod config;
mod error;
mod loader;

pub use config::{DEFAULT_IGNORED_DIRECTORIES, EngineSettings};
pub use error::{ConfigError, Result};
pub use loader::{CacheEntry, ConfigLoader};
