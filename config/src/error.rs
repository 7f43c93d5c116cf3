//! Error types for configuration loading.
//!
//! Covers reading and parsing `tfconfig.json` files as well as the YAML
//! engine settings file.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but is not a valid schema fragment.
    #[error("invalid configuration {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Settings file I/O failure.
    #[error("I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    /// Settings YAML parsing or serialization failure.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Path of the configuration file involved, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::SettingsIo(_) | Self::Settings(_) => None,
        }
    }
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
