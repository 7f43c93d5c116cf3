//! Revalidation on filesystem changes.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{Debouncer, new_debouncer};
use tracing::{debug, info, warn};
use typefiles_engine::{Orchestrator, ValidationReport};

/// Validates `root` once, then again after every debounced batch of changes.
///
/// Every batch triggers a run, including changes under ignored directories:
/// a validated directory's file listing covers its whole subtree. The watcher
/// is registered before the first run so no change is missed.
///
/// Blocks until the watcher shuts down or `on_report` returns `Ok(false)`.
/// An error from `on_report` ends the watch with that error.
pub fn watch<F>(
    orchestrator: &Orchestrator,
    root: &Path,
    debounce: Duration,
    mut on_report: F,
) -> Result<(), String>
where
    F: FnMut(&ValidationReport) -> Result<bool, String>,
{
    let watched = root
        .canonicalize()
        .map_err(|e| format!("Failed to watch {}: {e}", root.display()))?;
    let (tx, rx) = mpsc::channel();
    let mut debouncer: Debouncer<RecommendedWatcher> =
        new_debouncer(debounce, tx).map_err(|e| format!("Failed to start watcher: {e}"))?;
    debouncer
        .watcher()
        .watch(&watched, RecursiveMode::Recursive)
        .map_err(|e| format!("Failed to watch {}: {e}", watched.display()))?;

    let report = orchestrator.run(root).map_err(|e| e.to_string())?;
    if !on_report(&report)? {
        return Ok(());
    }
    info!(root = %watched.display(), "watching for changes");

    for result in rx {
        match result {
            Ok(events) => {
                debug!(events = events.len(), "revalidating after changes");
                let report = orchestrator.run(root).map_err(|e| e.to_string())?;
                if !on_report(&report)? {
                    break;
                }
            }
            Err(err) => warn!(error = %err, "watch error"),
        }
    }

    info!("stopped watching");
    Ok(())
}
