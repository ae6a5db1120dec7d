//! Settings loading from disk.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::error::{Result, SettingsError};
use crate::observability::metrics;
use crate::source::format::Format;
use crate::store::Store;

/// Ordered, duplicate-free list of the files that contributed settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    names: Vec<PathBuf>,
}

impl SourceSet {
    /// Append a file name unless it is already recorded or empty.
    pub fn insert(&mut self, name: PathBuf) -> bool {
        if name.as_os_str().is_empty() || self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.names.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.names.clone()
    }
}

/// Load a file, or every supported file under a directory, into `store`.
///
/// Stops at the first failure. Documents merged before the failure stay in
/// `store`; callers that need all-or-nothing pass a working copy.
pub fn load(path: &Path, store: &mut Store, sources: &mut SourceSet) -> Result<()> {
    if path.is_dir() {
        let files = list_supported_files(path);
        tracing::debug!(dir = ?path, files = files.len(), "Expanding settings directory");
        for file in &files {
            load_file(file, store, sources)?;
        }
        return Ok(());
    }
    load_file(path, store, sources)
}

fn load_file(path: &Path, store: &mut Store, sources: &mut SourceSet) -> Result<()> {
    let started = Instant::now();
    let result = merge_file(path, store);
    metrics::record_load(if result.is_ok() { "ok" } else { "error" }, started);

    let name = result?;
    if sources.insert(name.clone()) {
        metrics::record_sources(sources.len());
    }
    tracing::debug!(path = ?name, "Merged settings file");
    Ok(())
}

fn merge_file(path: &Path, store: &mut Store) -> Result<PathBuf> {
    let io_error = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(io_error)?;
    let format = Format::from_path(path).ok_or_else(|| SettingsError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let document = format.parse(&content, &path.display().to_string())?;
    let name = normalize(path).map_err(io_error)?;

    store.merge(document);
    Ok(name)
}

/// Every regular file under `dir` with a supported extension.
///
/// Siblings are visited in file-name order so that keys defined by more
/// than one file resolve the same way on every platform.
pub fn list_supported_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(dir = ?dir, error = %e, "Skipping unreadable settings entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| Format::from_path(entry.path()).is_some())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Absolute form of `path` with `.` dropped and `..` folded lexically.
pub fn normalize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
