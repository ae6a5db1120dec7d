//! Settings file watcher for automatic reload.

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::reload::config::WatchConfig;

/// A watcher that monitors one settings file for changes.
///
/// The parent directory is watched and events are filtered to the file
/// name, so editors that save by writing a new file and renaming it over
/// the old one are still seen.
pub struct SourceWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<PathBuf>,
}

impl SourceWatcher {
    /// Create a watcher that reports changes of `path` on `change_tx`.
    pub fn new(path: &Path, change_tx: mpsc::UnboundedSender<PathBuf>) -> Self {
        Self {
            path: path.to_path_buf(),
            change_tx,
        }
    }

    /// Start watching on notify's background thread.
    ///
    /// Watching stops when the returned watcher is dropped.
    pub fn run(self, config: &WatchConfig) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;
        let target = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_source_change(&event, &target) {
                        tracing::debug!(
                            path = ?target,
                            kind = ?event.kind,
                            "Settings file change detected"
                        );
                        metrics::record_watch_event();
                        let _ = tx.send(target.clone());
                    }
                }
                Err(e) => tracing::warn!(path = ?target, error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(config.poll_interval()),
        )?;

        let dir = self.path.parent().unwrap_or(self.path.as_path());
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Settings watcher started");
        Ok(watcher)
    }
}

/// Whether `event` creates or modifies the file at `target`.
pub(crate) fn is_source_change(event: &Event, target: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = target.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
