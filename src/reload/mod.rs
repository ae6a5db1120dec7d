//! Reload controller.
//!
//! # Data Flow
//! ```text
//! reload():
//!     lock source state
//!     → content (if any) + every recorded file, in order, into a fresh Store
//!     → narrow to the sub-tree prefix (if any)
//!     → atomic swap of Arc<Store>
//!     → ReloadEvent broadcast
//!
//! auto_reload():
//!     one notify watcher per source file
//!     → mpsc channel (changed path)
//!     → coordinator thread: debounce, drain, reload()
//! ```
//!
//! # States
//! - Static: default, reloads only when asked
//! - Watching: armed by auto_reload, lasts as long as the handle
//!
//! # Design Decisions
//! - Readers never block on a reload; they keep the old Store until the swap
//! - The first failed reload sticks to the handle and fails every later call
//! - Reloads are serialized by the source-state mutex; last one wins
//! - The coordinator holds a weak handle, so dropping the settings stops it

pub mod config;
pub mod watcher;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::error::{Result, SettingsError};
use crate::observability::metrics;
use crate::settings::{narrow, Settings, Shared, SourceState};
use crate::source::{self, SourceSet, CONTENT_ORIGIN};
use crate::store::Store;

pub use config::WatchConfig;
pub use watcher::SourceWatcher;

/// Outcome of a reload attempt, broadcast to [`Settings::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The store was rebuilt and swapped in.
    Reloaded {
        /// The changed file, or `None` for a manual reload.
        trigger: Option<PathBuf>,
    },
    /// The rebuild failed; the handle now carries the failure.
    Failed {
        trigger: Option<PathBuf>,
        error: String,
    },
}

/// Armed watchers; dropping them ends the watch.
pub(crate) struct WatchSet {
    _watchers: Vec<RecommendedWatcher>,
}

impl Settings {
    /// Rebuild the settings from the in-memory content and every recorded
    /// file, then swap them in.
    ///
    /// On failure the handle keeps the error: this and every later call
    /// fails until a new handle is created.
    pub fn reload(&self) -> Result<()> {
        self.reload_from(None)
    }

    /// Reload automatically whenever a recorded source file changes, using
    /// [`WatchConfig::default`].
    pub fn auto_reload(&self) -> Result<()> {
        self.auto_reload_with(WatchConfig::default())
    }

    /// Reload automatically whenever a recorded source file changes.
    ///
    /// Calling it again replaces the previous watch, picking up files merged
    /// since. Any change triggers a reload of the whole handle.
    pub fn auto_reload_with(&self, config: WatchConfig) -> Result<()> {
        self.ensure_healthy("auto_reload")?;
        let files = {
            let state = self.shared.lock_state();
            if state.files.is_empty() {
                tracing::debug!("No settings files to watch");
                return Ok(());
            }
            state.files.to_vec()
        };

        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let mut watchers = Vec::with_capacity(files.len());
        for file in &files {
            let watcher = SourceWatcher::new(file, change_tx.clone())
                .run(&config)
                .map_err(|source| {
                    SettingsError::Watch {
                        path: file.clone(),
                        source,
                    }
                    .during("auto_reload")
                })?;
            watchers.push(watcher);
        }
        drop(change_tx);

        spawn_coordinator(Arc::downgrade(&self.shared), change_rx, config.debounce())
            .map_err(|e| SettingsError::Coordinator(e).during("auto_reload"))?;
        *self.shared.lock_watch() = Some(WatchSet {
            _watchers: watchers,
        });

        tracing::info!(files = files.len(), "Settings auto reload armed");
        Ok(())
    }

    pub(crate) fn reload_from(&self, trigger: Option<&Path>) -> Result<()> {
        let state = self.shared.lock_state();
        self.ensure_healthy("reload")?;

        let started = Instant::now();
        let trigger_label = if trigger.is_some() { "watch" } else { "manual" };
        let trigger = trigger.map(Path::to_path_buf);

        let rebuilt = rebuild(&state);
        match rebuilt {
            Ok(store) => {
                self.shared.store.store(Arc::new(store));
                drop(state);

                metrics::record_reload("ok", trigger_label, started);
                tracing::info!(trigger = ?trigger, "Settings reloaded");
                let _ = self.shared.events.send(ReloadEvent::Reloaded { trigger });
                Ok(())
            }
            Err(e) => {
                let failure = Arc::new(e);
                self.shared.failure.store(Some(Arc::clone(&failure)));
                drop(state);

                metrics::record_reload("error", trigger_label, started);
                tracing::warn!(trigger = ?trigger, error = %failure, "Settings reload failed");
                let _ = self.shared.events.send(ReloadEvent::Failed {
                    trigger,
                    error: failure.to_string(),
                });
                Err(SettingsError::shared_during(failure, "reload"))
            }
        }
    }
}

/// Build a fresh store from everything the handle was made of.
fn rebuild(state: &SourceState) -> Result<Store> {
    let mut store = match &state.content {
        Some(content) => Store::from_mapping(content.format.parse(&content.text, CONTENT_ORIGIN)?),
        None => Store::default(),
    };

    let mut seen = SourceSet::default();
    for name in state.files.iter() {
        source::load(name, &mut store, &mut seen)?;
    }

    match &state.prefix {
        Some(prefix) => narrow(&store, prefix),
        None => Ok(store),
    }
}

fn spawn_coordinator(
    shared: Weak<Shared>,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    debounce: Duration,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name("settings-reload".into())
        .spawn(move || {
            while let Some(mut trigger) = changes.blocking_recv() {
                if !debounce.is_zero() {
                    thread::sleep(debounce);
                }
                while let Ok(next) = changes.try_recv() {
                    trigger = next;
                }

                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let settings = Settings { shared };
                if let Err(e) = settings.reload_from(Some(&trigger)) {
                    tracing::error!(
                        trigger = ?trigger,
                        error = %e,
                        "Automatic reload failed, no further reloads for this handle"
                    );
                    break;
                }
            }
            tracing::debug!("Settings reload coordinator stopped");
        })?;
    Ok(())
}
