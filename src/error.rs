//! Error definitions shared by every settings operation.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::store::Kind;

/// Errors that can occur while loading, reading or reloading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source file or directory could not be read.
    #[error("open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was given directly whose extension is not json, yaml or yml.
    #[error("unsupported file format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// In-memory content parsed neither as JSON nor as YAML.
    #[error("unsupported content type")]
    UnsupportedContent,

    /// Malformed JSON document.
    #[error("while parsing {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed YAML document.
    #[error("while parsing {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed, but its root is not a mapping.
    #[error("while parsing {origin}: document root should be a mapping, not: {found}")]
    InvalidDocument { origin: String, found: Kind },

    /// The key does not resolve to a value.
    #[error("{key} :: cannot find value in configuration")]
    NotFound { key: String },

    /// The value exists but holds a different variant than requested.
    #[error("the value of key: {key} :: should be type: {want}, not: {got}")]
    TypeMismatch { key: String, want: Kind, got: Kind },

    /// An integer sequence contains a non-integer element.
    #[error("the value of key: {key} :: should be type: []int, not: {got} at index {index}")]
    ElementMismatch { key: String, index: usize, got: Kind },

    /// An integer that cannot be represented as the requested time type.
    #[error("the value of key: {key} :: {value} is out of range")]
    OutOfRange { key: String, value: i64 },

    /// A sub-tree could not be deserialized into the caller's type.
    #[error("the value of key: {key} :: {source}")]
    Extract {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A file watch could not be armed.
    #[error("watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The reload coordinator thread could not be started.
    #[error("reload coordinator: {0}")]
    Coordinator(#[source] std::io::Error),

    /// An error tagged with the public operation that surfaced it.
    #[error("settings.{op} :: {source}")]
    Context {
        op: &'static str,
        #[source]
        source: Arc<SettingsError>,
    },
}

impl SettingsError {
    /// Tag this error with the operation that surfaced it.
    pub fn during(self, op: &'static str) -> Self {
        Self::Context {
            op,
            source: Arc::new(self),
        }
    }

    /// Tag an already shared error (the sticky failure) with an operation.
    pub(crate) fn shared_during(source: Arc<SettingsError>, op: &'static str) -> Self {
        Self::Context { op, source }
    }

    /// The innermost error, with every operation tag peeled off.
    pub fn root(&self) -> &SettingsError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
