//! Merged key/value tree with case-insensitive dotted-path lookup.

use crate::store::value::{normalize_mapping, Mapping, Value};

/// Path separator for nested keys.
pub const KEY_DELIMITER: char = '.';

/// The merged settings of every loaded source.
///
/// Keys are lower-cased on the way in, so lookups only need to lower-case
/// the query. Values keep their case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    root: Mapping,
}

impl Store {
    /// Create a store holding a single document.
    pub fn from_mapping(mapping: Mapping) -> Self {
        let mut store = Self::default();
        store.merge(mapping);
        store
    }

    /// Merge a document over the current tree.
    ///
    /// Mappings present on both sides merge recursively; anything else in
    /// `incoming` replaces what was there. Keys only present in the current
    /// tree are kept.
    pub fn merge(&mut self, incoming: Mapping) {
        merge_into(&mut self.root, normalize_mapping(incoming));
    }

    /// Resolve a dotted key. `Null` values are returned as-is.
    pub fn find(&self, key: &str) -> Option<&Value> {
        if key.is_empty() {
            return None;
        }
        let key = key.to_lowercase();
        let mut parts = key.split(KEY_DELIMITER);
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }

    /// Whether the key resolves to a non-null value.
    pub fn is_set(&self, key: &str) -> bool {
        self.find(key).is_some_and(|v| !v.is_null())
    }

    /// Every leaf key holding a value, dotted and sorted.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys);
        keys.sort();
        keys
    }

    /// The whole tree as a nested mapping.
    pub fn all_settings(&self) -> Mapping {
        self.root.clone()
    }

    /// A store rooted at the mapping found under `prefix`.
    ///
    /// Returns the found value on the error side when it is not a mapping,
    /// so callers can report what was there instead.
    pub fn sub(&self, prefix: &str) -> Option<Result<Store, &Value>> {
        let value = self.find(prefix)?;
        Some(match value {
            Value::Mapping(m) => Ok(Store { root: m.clone() }),
            other => Err(other),
        })
    }
}

fn merge_into(target: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        match (target.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(update)) => {
                merge_into(existing, update)
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn collect_keys(mapping: &Mapping, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in mapping {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, KEY_DELIMITER, key)
        };
        match value {
            Value::Mapping(inner) => collect_keys(inner, &path, keys),
            Value::Null => {}
            _ => keys.push(path),
        }
    }
}
