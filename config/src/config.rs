//! Engine settings.
//!
//! Controls how the engine walks a workspace: which file name holds the
//! per-directory rules, which directories are never scanned, and how many
//! worker threads validate directories in parallel.
//!
//! # Example YAML
//!
//! ```yaml
//! config_file_name: tfconfig.json
//! ignored_directories:
//!   - node_modules
//!   - dist
//!   - build
//!   - target
//! scan_hidden_directories: false
//! include_hidden_files: true
//! jobs: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use typefiles_core::CONFIG_FILE_NAME;

use crate::error::Result;

/// Directory names skipped during workspace enumeration by default.
pub const DEFAULT_IGNORED_DIRECTORIES: &[&str] = &["node_modules", "dist", "build", "target"];

/// Workspace scanning settings.
///
/// Every field has a default, so a settings file only needs the keys it
/// changes.
///
/// # Examples
///
/// ```
/// use typefiles_config::EngineSettings;
///
/// let settings: EngineSettings = serde_yaml::from_str("jobs: 2").unwrap();
/// assert_eq!(settings.jobs, Some(2));
/// assert_eq!(settings.config_file_name, "tfconfig.json");
/// assert!(settings.is_ignored_directory("node_modules"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Name of the per-directory configuration file.
    pub config_file_name: String,
    /// Directory names (not paths) never descended into.
    pub ignored_directories: Vec<String>,
    /// Descend into directories whose name starts with a dot.
    pub scan_hidden_directories: bool,
    /// Include dotfiles in directory listings and pattern matches.
    pub include_hidden_files: bool,
    /// Worker threads for validation (`None` = one per CPU).
    pub jobs: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            config_file_name: CONFIG_FILE_NAME.to_string(),
            ignored_directories: DEFAULT_IGNORED_DIRECTORIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            scan_hidden_directories: false,
            include_hidden_files: true,
            jobs: None,
        }
    }
}

impl EngineSettings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsIo`](crate::ConfigError::SettingsIo) if the file
    /// cannot be read, or [`Settings`](crate::ConfigError::Settings) if
    /// parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader)?;
        Ok(settings)
    }

    /// Saves the settings as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if a directory called `name` must not be scanned.
    pub fn is_ignored_directory(&self, name: &str) -> bool {
        if !self.scan_hidden_directories && name.starts_with('.') {
            return true;
        }
        self.ignored_directories.iter().any(|ignored| ignored == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.config_file_name, CONFIG_FILE_NAME);
        assert!(settings.include_hidden_files);
        assert!(settings.is_ignored_directory("dist"));
        assert!(settings.is_ignored_directory(".git"));
        assert!(!settings.is_ignored_directory("src"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
ignored_directories:
  - vendor
scan_hidden_directories: true
"#;
        let settings: EngineSettings = serde_yaml::from_str(yaml).unwrap();
        assert!(settings.is_ignored_directory("vendor"));
        assert!(!settings.is_ignored_directory("node_modules"));
        assert!(!settings.is_ignored_directory(".github"));
        assert_eq!(settings.jobs, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typefiles.yml");

        let settings = EngineSettings {
            jobs: Some(3),
            config_file_name: "rules.json".to_string(),
            ..EngineSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = EngineSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineSettings::load(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, crate::ConfigError::SettingsIo(_)));
    }
}
