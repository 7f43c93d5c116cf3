//! Effective schema resolution.
//!
//! A directory's effective schema is built from the configuration files of
//! the directory itself and each of its ancestors up to the workspace root,
//! merged farther to closer. Directories with no configuration anywhere on
//! that chain have no schema and are not validated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use typefiles_config::{ConfigError, ConfigLoader};
use typefiles_core::{SchemaFragment, anchor_fragment, merge_chain};

/// Walks ancestor directories and merges their configuration fragments.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    loader: Arc<ConfigLoader>,
}

impl SchemaResolver {
    pub fn new(loader: Arc<ConfigLoader>) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Returns the anchored fragments applying to `directory`, root first.
    ///
    /// Containment in the workspace is decided on canonicalized paths,
    /// component by component.
    ///
    /// # Errors
    ///
    /// Fails with the first [`ConfigError`] met on the way up; a malformed
    /// configuration file is never treated as "no configuration".
    pub fn resolve_chain(
        &self,
        directory: &Path,
        workspace_root: &Path,
    ) -> Result<Vec<SchemaFragment>, ConfigError> {
        let root = canonical(workspace_root);
        let mut current = canonical(directory);
        let mut chain = Vec::new();

        while current.starts_with(&root) {
            if let Some(fragment) = self.loader.load_dir(&current)? {
                let origin_dir = fragment.origin_dir().unwrap_or(&current);
                debug!(config = ?fragment.origin, "found configuration");
                chain.push(anchor_fragment(&fragment, origin_dir));
            }

            match current.parent() {
                Some(parent) if parent != current => current = parent.to_path_buf(),
                _ => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Returns the effective schema for `directory`, or `None` when no
    /// configuration file applies to it.
    pub fn resolve(
        &self,
        directory: &Path,
        workspace_root: &Path,
    ) -> Result<Option<SchemaFragment>, ConfigError> {
        let chain = self.resolve_chain(directory, workspace_root)?;
        Ok(merge_chain(&chain))
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use typefiles_core::CONFIG_FILE_NAME;

    use super::*;

    fn resolver() -> SchemaResolver {
        SchemaResolver::new(Arc::new(ConfigLoader::new()))
    }

    fn write_config(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), body).unwrap();
    }

    #[test]
    fn test_directory_without_configuration_is_exempt() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        assert!(resolver().resolve(&nested, dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_closer_configuration_extends_farther() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write_config(&root, r#"{ "required": ["README.md"], "patterns": ["*.md"] }"#);
        write_config(&root.join("pkg"), r#"{ "required": ["index.ts"] }"#);
        fs::create_dir_all(root.join("pkg/src")).unwrap();

        let schema = resolver().resolve(&root.join("pkg/src"), &root).unwrap().unwrap();
        assert_eq!(schema.required_patterns(), ["README.md", "index.ts"]);
        assert_eq!(schema.patterns.as_deref().unwrap(), ["*.md"]);
        assert_eq!(schema.origin, Some(root.join("pkg").join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_configuration_above_root_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{ "required": ["outside.txt"] }"#);
        let workspace = dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();

        assert!(resolver().resolve(&workspace, &workspace).unwrap().is_none());
    }

    #[test]
    fn test_relative_entries_are_anchored_at_their_origin() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write_config(&root, r#"{ "required": ["./LICENSE", "README.md"] }"#);
        fs::create_dir_all(root.join("sub")).unwrap();

        let chain = resolver().resolve_chain(&root.join("sub"), &root).unwrap();
        assert_eq!(chain.len(), 1);
        let anchored = format!("{}/LICENSE", root.to_string_lossy().replace('\\', "/"));
        assert_eq!(chain[0].required_patterns(), [anchored.as_str(), "README.md"]);
    }

    #[test]
    fn test_malformed_ancestor_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "{ nope");
        fs::create_dir_all(dir.path().join("child")).unwrap();

        let err = resolver()
            .resolve(&dir.path().join("child"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
