use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;

/// Default patterns to ignore when watching the filesystem.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "venv",
    ".venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ropeproject",
];

/// Default flood threshold (events per debounce window).
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Filesystem watcher over the top-level directories of the browser.
pub struct FsWatcher {
    /// Whether the watcher is currently forwarding events.
    active: Arc<AtomicBool>,
    roots: Arc<Mutex<Vec<PathBuf>>>,
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Create a watcher for `roots`, each watched recursively.
    ///
    /// Events are debounced by `debounce_duration` and sent via `event_tx`.
    /// Paths matching any of `ignore_patterns` are dropped. More than
    /// `flood_threshold` events in one window collapse into one event per
    /// affected root.
    pub fn new(
        roots: &[PathBuf],
        debounce_duration: Duration,
        ignore_patterns: Vec<String>,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let shared_roots = Arc::new(Mutex::new(Vec::new()));
        let active_clone = active.clone();
        let roots_clone = shared_roots.clone();

        let debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_clone.load(Ordering::Relaxed) {
                    return;
                }

                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p, &ignore_patterns))
                            .collect();

                        if paths.is_empty() {
                            return;
                        }

                        let roots = roots_clone
                            .lock()
                            .map(|r| r.clone())
                            .unwrap_or_default();
                        let final_paths = collapse_flood(paths, &roots, flood_threshold);
                        let _ = event_tx.send(Event::FsChange(final_paths));
                    }
                    Err(err) => {
                        tracing::debug!(%err, "watcher error");
                    }
                }
            },
        )?;

        let mut watcher = Self {
            active,
            roots: shared_roots,
            debouncer,
        };
        for root in roots {
            watcher.watch(root)?;
        }
        Ok(watcher)
    }

    /// Start watching another top-level directory.
    pub fn watch(&mut self, root: &Path) -> notify::Result<()> {
        self.debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;
        if let Ok(mut roots) = self.roots.lock() {
            if !roots.iter().any(|r| r == root) {
                roots.push(root.to_path_buf());
            }
        }
        tracing::debug!(root = %root.display(), "watching");
        Ok(())
    }

    /// Stop watching a top-level directory.
    pub fn unwatch(&mut self, root: &Path) -> notify::Result<()> {
        if let Ok(mut roots) = self.roots.lock() {
            roots.retain(|r| r != root);
        }
        self.debouncer.watcher().unwatch(root)
    }

    /// Pause event forwarding (watches stay registered).
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    /// Check if the watcher is currently forwarding events.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Check if a path should be ignored based on ignore patterns.
///
/// A path is ignored if any of its components match any ignore pattern exactly.
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            patterns.iter().any(|p| name == p.as_str())
        }
        _ => false,
    })
}

/// Replace a flood of changed paths with the roots that contain them.
pub fn collapse_flood(paths: Vec<PathBuf>, roots: &[PathBuf], threshold: usize) -> Vec<PathBuf> {
    if paths.len() <= threshold {
        return paths;
    }
    let affected: Vec<PathBuf> = roots
        .iter()
        .filter(|root| paths.iter().any(|p| p.starts_with(root)))
        .cloned()
        .collect();
    if affected.is_empty() {
        paths
    } else {
        affected
    }
}
