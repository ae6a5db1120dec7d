//! Document formats and their detection.

use std::fmt;
use std::path::Path;

use crate::error::{Result, SettingsError};
use crate::store::{Mapping, Value};

/// Origin label used in parse errors for in-memory content.
pub const CONTENT_ORIGIN: &str = "content";

/// A supported document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Map a file extension (without the dot, any ASCII case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect the format of raw text by parsing it: JSON first, then YAML.
    ///
    /// Only documents whose root is a mapping qualify. The parsed document
    /// is returned so callers do not parse twice.
    pub fn sniff(text: &str) -> Option<(Format, Mapping)> {
        [Format::Json, Format::Yaml]
            .into_iter()
            .find_map(|format| format.parse(text, CONTENT_ORIGIN).ok().map(|doc| (format, doc)))
    }

    /// Parse a document whose root must be a mapping.
    ///
    /// An empty YAML document is an empty mapping.
    pub fn parse(self, text: &str, origin: &str) -> Result<Mapping> {
        let value = match self {
            Format::Json => serde_json::from_str::<serde_json::Value>(text)
                .map(Value::from)
                .map_err(|source| SettingsError::Json {
                    origin: origin.to_string(),
                    source,
                })?,
            Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
                .and_then(|mut doc| {
                    // `<<: *anchor` merge keys are resolved only on request.
                    doc.apply_merge()?;
                    Ok(doc)
                })
                .map(Value::from)
                .map_err(|source| SettingsError::Yaml {
                    origin: origin.to_string(),
                    source,
                })?,
        };

        match value {
            Value::Mapping(m) => Ok(m),
            Value::Null if self == Format::Yaml => Ok(Mapping::new()),
            other => Err(SettingsError::InvalidDocument {
                origin: origin.to_string(),
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}
