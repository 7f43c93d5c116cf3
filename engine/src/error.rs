//! Error types for the validation engine.

use std::path::PathBuf;

use thiserror::Error;

/// Failure local to one directory's validation.
///
/// Never escapes the validator: each one is turned into a finding for the
/// directory being checked.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A directory or file became unreadable or vanished mid-scan.
    #[error("error accessing {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured glob could not be compiled.
    #[error("invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl ValidateError {
    pub(crate) fn from_walk(base: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(base).to_path_buf();
        Self::Access {
            path,
            source: err.into(),
        }
    }

    pub(crate) fn pattern(pattern: &str, err: &globset::Error) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            reason: err.kind().to_string(),
        }
    }
}

/// Failure that aborts a whole validation run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workspace root could not be resolved or listed.
    #[error("failed to enumerate workspace {}: {source}", .root.display())]
    WorkspaceEnumeration {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience alias for results with [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
