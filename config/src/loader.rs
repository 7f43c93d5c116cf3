//! Configuration file loading with modification-time invalidation.
//!
//! [`ConfigLoader`] parses `tfconfig.json` files into [`SchemaFragment`]s and
//! keeps one cache entry per file path. An entry is reused as long as the
//! file's modification time is not newer than the moment it was loaded; the
//! check costs one `stat` per lookup.
//!
//! The cache is owned by the loader instance and shared between threads.
//! Concurrent loads of the same unchanged file produce equal fragments, so a
//! race only costs a redundant read and the last writer wins.
//!
//! ```no_run
//! use typefiles_config::ConfigLoader;
//!
//! let loader = ConfigLoader::new();
//! if let Some(fragment) = loader.load_dir("./packages/app".as_ref()).unwrap() {
//!     println!("{:?}", fragment.required);
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use tracing::debug;
use typefiles_core::{CONFIG_FILE_NAME, SchemaFragment};

use crate::error::{ConfigError, Result};

/// Cached configuration file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fragment: Arc<SchemaFragment>,
    /// Wall-clock time taken just before the file was read.
    pub loaded_at: SystemTime,
}

/// Loads and caches schema fragments keyed by configuration file path.
#[derive(Debug)]
pub struct ConfigLoader {
    file_name: String,
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader for the reserved [`CONFIG_FILE_NAME`].
    pub fn new() -> Self {
        Self::with_file_name(CONFIG_FILE_NAME)
    }

    /// Creates a loader looking for `file_name` in each directory.
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path where the configuration file for `dir` would live.
    pub fn config_path_for(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    /// Loads the configuration file of `dir`, if there is one.
    pub fn load_dir(&self, dir: &Path) -> Result<Option<Arc<SchemaFragment>>> {
        self.load(&self.config_path_for(dir))
    }

    /// Loads one configuration file.
    ///
    /// Returns `Ok(None)` when nothing exists at `path`. The returned fragment
    /// has its origin set to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the file is not a valid schema
    /// fragment and [`ConfigError::Io`] if it exists but cannot be read.
    pub fn load(&self, path: &Path) -> Result<Option<Arc<SchemaFragment>>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        if let Some(entry) = self.cached(path) {
            let fresh = metadata
                .modified()
                .is_ok_and(|modified| modified <= entry.loaded_at);
            if fresh {
                return Ok(Some(entry.fragment));
            }
            debug!(path = %path.display(), "configuration changed on disk, reloading");
        }

        let loaded_at = SystemTime::now();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fragment: SchemaFragment =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let fragment = Arc::new(fragment.with_origin(path));

        debug!(path = %path.display(), "loaded configuration");
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.to_path_buf(),
                CacheEntry {
                    fragment: Arc::clone(&fragment),
                    loaded_at,
                },
            );

        Ok(Some(fragment))
    }

    /// Returns the cache entry for `path` without touching the filesystem.
    pub fn cached(&self, path: &Path) -> Option<CacheEntry> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Number of configuration files seen so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
