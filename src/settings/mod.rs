//! The caller-facing settings handle.
//!
//! # Data Flow
//! ```text
//! Settings::new(path) / Settings::from_content(text)
//!     → source::load / Format::sniff
//!     → Store published through ArcSwap
//!
//! merge(path):  working copy of Store + SourceSet → load → publish
//! get_*(key):   failure check → Store snapshot → variant check → T
//! sub_tree(p):  new handle over the mapping at p (receiver untouched)
//! ```
//!
//! # Design Decisions
//! - Constructors and merge return Result; nothing half-built is handed out
//! - Only reload can leave a failure on a live handle (see reload module)
//! - Clones share state; sub_tree creates an independent handle

mod accessors;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::broadcast;

use crate::error::{Result, SettingsError};
use crate::reload::{ReloadEvent, WatchSet};
use crate::source::{self, Format, SourceSet};
use crate::store::{Kind, Store, Value, KEY_DELIMITER};

const EVENT_CAPACITY: usize = 16;

/// Merged configuration from files, directories or in-memory text.
///
/// Cloning is cheap and clones observe the same reloads.
#[derive(Clone)]
pub struct Settings {
    pub(crate) shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) store: ArcSwap<Store>,
    /// First reload failure; written only while `state` is locked.
    pub(crate) failure: ArcSwapOption<SettingsError>,
    /// Also serves as the reload guard.
    pub(crate) state: Mutex<SourceState>,
    pub(crate) events: broadcast::Sender<ReloadEvent>,
    pub(crate) watch: Mutex<Option<WatchSet>>,
}

/// Everything needed to rebuild the store from scratch.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceState {
    pub(crate) content: Option<Content>,
    pub(crate) files: SourceSet,
    /// Dotted key the handle is narrowed to, if it came from `sub_tree`.
    pub(crate) prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Content {
    pub(crate) text: String,
    pub(crate) format: Format,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_watch(&self) -> MutexGuard<'_, Option<WatchSet>> {
        self.watch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Settings {
    fn from_parts(store: Store, state: SourceState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                store: ArcSwap::from_pointee(store),
                failure: ArcSwapOption::empty(),
                state: Mutex::new(state),
                events,
                watch: Mutex::new(None),
            }),
        }
    }

    /// Load settings from a file, or from every json/yaml/yml file under a
    /// directory (visited in file-name order).
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut store = Store::default();
        let mut state = SourceState::default();
        source::load(path, &mut store, &mut state.files).map_err(|e| e.during("new"))?;

        tracing::info!(path = ?path, sources = state.files.len(), "Settings loaded");
        Ok(Self::from_parts(store, state))
    }

    /// Load settings from in-memory JSON or YAML text.
    ///
    /// The text is kept so that [`Settings::reload`] can re-apply it
    /// underneath any files merged later.
    pub fn from_content(content: impl Into<String>) -> Result<Self> {
        let text = content.into();
        let (format, document) = Format::sniff(&text)
            .ok_or_else(|| SettingsError::UnsupportedContent.during("new_from_content"))?;

        tracing::info!(%format, "Settings loaded from content");
        let state = SourceState {
            content: Some(Content { text, format }),
            ..SourceState::default()
        };
        Ok(Self::from_parts(Store::from_mapping(document), state))
    }

    /// Merge a file or directory over the current settings.
    ///
    /// All-or-nothing: on failure the handle keeps its previous view.
    pub fn merge(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut state = self.shared.lock_state();
        self.ensure_healthy("merge")?;

        let mut store = Store::clone(&self.shared.store.load_full());
        let mut files = state.files.clone();
        match &state.prefix {
            None => source::load(path, &mut store, &mut files),
            Some(prefix) => {
                // Narrow the new document the same way reload will.
                let mut loaded = Store::default();
                source::load(path, &mut loaded, &mut files).and_then(|()| {
                    ensure_prefix_kept(&loaded, prefix)?;
                    if let Some(Ok(sub)) = loaded.sub(prefix) {
                        store.merge(sub.all_settings());
                    }
                    Ok(())
                })
            }
        }
        .map_err(|e| e.during("merge"))?;

        tracing::info!(path = ?path, sources = files.len(), "Settings merged");
        state.files = files;
        self.shared.store.store(Arc::new(store));
        drop(state);
        Ok(self)
    }

    /// A new handle narrowed to the mapping under `prefix`.
    ///
    /// The receiver is left untouched. The new handle keeps the same
    /// sources, so reloading it re-reads them and narrows again.
    pub fn sub_tree(&self, prefix: &str) -> Result<Settings> {
        let state = self.shared.lock_state();
        self.ensure_healthy("sub_tree")?;

        let store = narrow(&self.shared.store.load(), prefix).map_err(|e| e.during("sub_tree"))?;
        let prefix = match &state.prefix {
            Some(parent) => format!("{}.{}", parent, prefix),
            None => prefix.to_string(),
        };
        let state = SourceState {
            prefix: Some(prefix),
            ..state.clone()
        };
        Ok(Self::from_parts(store, state))
    }

    /// Absolute names of every file merged so far, in load order.
    pub fn file_names(&self) -> Result<Vec<PathBuf>> {
        self.ensure_healthy("file_names")?;
        Ok(self.shared.lock_state().files.to_vec())
    }

    /// The failure left by a failed reload, if any.
    pub fn failure(&self) -> Option<Arc<SettingsError>> {
        self.shared.failure.load_full()
    }

    /// Receive an event for every reload attempt on this handle.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.shared.events.subscribe()
    }

    pub(crate) fn ensure_healthy(&self, op: &'static str) -> Result<()> {
        match self.shared.failure.load_full() {
            Some(failure) => Err(SettingsError::shared_during(failure, op)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock_state();
        f.debug_struct("Settings")
            .field("files", &state.files)
            .field("prefix", &state.prefix)
            .field("from_content", &state.content.is_some())
            .field("failed", &self.failure().is_some())
            .finish()
    }
}

/// The sub-store under `prefix`, or why there is none.
pub(crate) fn narrow(store: &Store, prefix: &str) -> Result<Store> {
    match store.sub(prefix) {
        Some(Ok(sub)) => Ok(sub),
        Some(Err(found)) => Err(SettingsError::TypeMismatch {
            key: prefix.to_string(),
            want: Kind::Mapping,
            got: found.kind(),
        }),
        None => Err(SettingsError::NotFound {
            key: prefix.to_string(),
        }),
    }
}

/// Fail if merging `loaded` would replace `prefix`, or a parent of it, with
/// a non-mapping. Reload would no longer be able to narrow such a handle.
fn ensure_prefix_kept(loaded: &Store, prefix: &str) -> Result<()> {
    let parents = prefix
        .match_indices(KEY_DELIMITER)
        .map(|(end, _)| &prefix[..end]);
    for key in parents.chain(std::iter::once(prefix)) {
        match loaded.find(key) {
            None | Some(Value::Mapping(_)) => {}
            Some(other) => {
                return Err(SettingsError::TypeMismatch {
                    key: key.to_string(),
                    want: Kind::Mapping,
                    got: other.kind(),
                })
            }
        }
    }
    Ok(())
}
