//! End-to-end validation of on-disk workspaces.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use typefiles_config::{ConfigLoader, EngineSettings};
use typefiles_core::Severity;
use typefiles_engine::{
    EngineError, Orchestrator, SchemaResolver, ValidationReport, validate_workspace,
};

/// Temporary workspace with a canonical root path.
struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = fs::canonicalize(dir.path()).expect("failed to canonicalize temp dir");
        Self { _dir: dir, root }
    }

    fn file(&self, rel: &str, contents: &str) -> &Self {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    fn dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.root.join(rel)).unwrap();
        self
    }

    fn config(&self, rel_dir: &str, json: serde_json::Value) -> &Self {
        let rel = if rel_dir.is_empty() {
            "tfconfig.json".to_string()
        } else {
            format!("{rel_dir}/tfconfig.json")
        };
        self.file(&rel, &json.to_string())
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn validate(&self) -> ValidationReport {
        validate_workspace(&self.root).expect("validation failed")
    }
}

fn messages_at<'a>(report: &'a ValidationReport, location: &Path) -> Vec<&'a str> {
    report
        .findings_for(location)
        .unwrap_or_default()
        .iter()
        .map(|f| f.message.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Exemption and required patterns
// ---------------------------------------------------------------------------

#[test]
fn directories_without_configuration_are_exempt() {
    let ws = Workspace::new();
    ws.file("a/random.bin", "").file("b/c/other.txt", "");

    let report = ws.validate();
    assert!(report.is_clean());
    assert_eq!(report.directories_scanned, 4);
}

#[test]
fn required_pattern_counts_matches() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "required": ["README.md", "*.ts"] }))
        .file("README.md", "")
        .file("a.ts", "")
        .file("b.ts", "");
    assert!(ws.validate().is_clean());

    fs::remove_file(ws.path("a.ts")).unwrap();
    fs::remove_file(ws.path("b.ts")).unwrap();
    let report = ws.validate();
    assert_eq!(
        messages_at(&report, &ws.root),
        ["Missing required file matching pattern: *.ts"]
    );
}

#[test]
fn child_directories_inherit_and_extend() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "required": ["README.md"] }))
        .file("README.md", "")
        .config("pkg", serde_json::json!({ "required": ["index.ts"] }))
        .file("pkg/README.md", "");

    let report = ws.validate();
    assert_eq!(
        messages_at(&report, &ws.path("pkg")),
        ["Missing required file matching pattern: index.ts"]
    );
    assert!(report.findings_for(&ws.root).is_none());
}

#[test]
fn anchored_required_entry_checks_config_directory() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "required": ["./LICENSE"] }))
        .file("LICENSE", "")
        .dir("sub");

    // every directory inherits the rule, all satisfied by the root's LICENSE
    assert!(ws.validate().is_clean());

    fs::remove_file(ws.path("LICENSE")).unwrap();
    let report = ws.validate();
    assert_eq!(report.directories.len(), 2);
    assert_eq!(report.error_count(), 2);
}

// ---------------------------------------------------------------------------
// Allowed patterns and exclusion
// ---------------------------------------------------------------------------

#[test]
fn allowed_patterns_warn_about_strays() {
    let ws = Workspace::new();
    ws.config(
        "src",
        serde_json::json!({ "required": ["lib.rs"], "patterns": ["*.rs"] }),
    )
    .file("src/lib.rs", "")
    .file("src/util.rs", "")
    .file("src/notes.md", "");

    let report = ws.validate();
    let findings = report.findings_for(&ws.path("src")).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].message, "File notes.md doesn't match required patterns");
    assert_eq!(findings[0].path, ws.path("src/notes.md"));
}

#[test]
fn required_matches_count_as_allowed() {
    let ws = Workspace::new();
    ws.config(
        "",
        serde_json::json!({ "required": ["Cargo.toml"], "patterns": ["*.rs"] }),
    )
    .file("Cargo.toml", "");

    assert!(ws.validate().is_clean());
}

#[test]
fn exclusion_wins_over_allowed_patterns() {
    let ws = Workspace::new();
    ws.config(
        "",
        serde_json::json!({ "patterns": ["*.md"], "exclude": ["scratch/**", "*.log"] }),
    )
    .file("README.md", "")
    .file("debug.log", "")
    .file("scratch/tmp.bin", "");

    let report = ws.validate();
    assert!(report.findings_for(&ws.root).is_none());
    // scratch has its own entry: exclusion is relative to each validated directory
    assert_eq!(
        messages_at(&report, &ws.path("scratch")),
        ["File tmp.bin doesn't match required patterns"]
    );
}

// ---------------------------------------------------------------------------
// Directories map and mirror rules
// ---------------------------------------------------------------------------

#[test]
fn directories_entry_validates_each_match() {
    let ws = Workspace::new();
    ws.config(
        "",
        serde_json::json!({
            "directories": { "packages/*": { "required": ["package.json"] } }
        }),
    )
    .file("packages/a/package.json", "{}")
    .dir("packages/b");

    let report = ws.validate();
    assert_eq!(report.directories.len(), 1);
    assert_eq!(
        messages_at(&report, &ws.path("packages/b")),
        ["Missing required file matching pattern: package.json"]
    );
}

#[test]
fn mirror_rule_requires_same_file_names() {
    let ws = Workspace::new();
    ws.config(
        "locales",
        serde_json::json!({
            "matchRules": [{ "schemaDirectory": "./en", "targetDirectories": "./*" }]
        }),
    )
    .file("locales/en/x.json", "")
    .file("locales/en/y.json", "")
    .file("locales/fr/x.json", "")
    .file("locales/fr/y.json", "")
    .file("locales/de/x.json", "");

    let report = ws.validate();
    assert_eq!(report.directories.len(), 1);
    let de = ws.path("locales/de");
    assert_eq!(
        messages_at(&report, &de),
        [format!("Missing file: y.json in {}", de.display()).as_str()]
    );
}

// ---------------------------------------------------------------------------
// Configuration problems, determinism and fatal errors
// ---------------------------------------------------------------------------

#[test]
fn malformed_configuration_is_reported_once() {
    let ws = Workspace::new();
    ws.file("tfconfig.json", "{ \"required\": ")
        .dir("a")
        .dir("b");

    let report = ws.validate();
    let config = ws.path("tfconfig.json");
    assert_eq!(report.directories.len(), 1);
    assert_eq!(report.directories[0].location, config);
    assert!(report.directories[0].findings[0]
        .message
        .starts_with("invalid configuration"));
}

#[test]
fn unknown_configuration_keys_are_rejected() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "requird": ["typo.md"] }));

    let report = ws.validate();
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.directories[0].location, ws.path("tfconfig.json"));
}

#[test]
fn reruns_on_unchanged_tree_are_identical() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "required": ["missing.txt"], "patterns": ["*.md"] }));
    for name in ["a", "b", "c", "d"] {
        ws.file(&format!("{name}/stray.bin"), "");
    }

    let orchestrator = Orchestrator::new(EngineSettings::default());
    let first = orchestrator.run(&ws.root).unwrap();
    let second = orchestrator.run(&ws.root).unwrap();
    assert_eq!(first.directories, second.directories);
    assert_eq!(first.directories.len(), 5);
}

#[test]
fn resolver_sees_configuration_edits() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "required": ["a.txt"] }));
    let resolver = SchemaResolver::new(Arc::new(ConfigLoader::new()));

    let first = resolver.resolve(&ws.root, &ws.root).unwrap().unwrap();
    assert_eq!(first.required_patterns(), ["a.txt"]);

    ws.config("", serde_json::json!({ "required": ["b.txt"] }));
    let file = fs::File::options()
        .write(true)
        .open(ws.path("tfconfig.json"))
        .unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    let second = resolver.resolve(&ws.root, &ws.root).unwrap().unwrap();
    assert_eq!(second.required_patterns(), ["b.txt"]);
}

#[test]
fn ignored_directories_are_not_scanned() {
    let ws = Workspace::new();
    ws.config("", serde_json::json!({ "patterns": ["*.md"] }))
        .file("node_modules/dep/index.js", "")
        .file(".git/HEAD", "");

    let report = ws.validate();
    // files inside ignored directories still belong to the root's listing
    let root_messages = messages_at(&report, &ws.root);
    assert!(root_messages.contains(&"File node_modules/dep/index.js doesn't match required patterns"));
    assert!(report.findings_for(&ws.path("node_modules/dep")).is_none());
    assert!(report.findings_for(&ws.path(".git")).is_none());
}

#[test]
fn missing_root_aborts_run() {
    let ws = Workspace::new();
    let err = validate_workspace(ws.path("nope")).unwrap_err();
    assert!(matches!(err, EngineError::WorkspaceEnumeration { .. }));
}
