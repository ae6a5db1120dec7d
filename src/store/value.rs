//! Tagged value model for parsed configuration documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Nested mapping of lower-cased keys to values.
pub type Mapping = BTreeMap<String, Value>;

/// A configuration value as parsed from JSON or YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// The variant of a [`Value`], used in type mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Mapping(_) => Kind::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Lower-case every mapping key, recursively.
    pub(crate) fn normalize_keys(self) -> Value {
        match self {
            Value::Mapping(m) => Value::Mapping(normalize_mapping(m)),
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::normalize_keys).collect())
            }
            other => other,
        }
    }
}

pub(crate) fn normalize_mapping(mapping: Mapping) -> Mapping {
    mapping
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.normalize_keys()))
        .collect()
}

/// Scalars render bare; sequences and mappings render as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Sequence(_) | Value::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

// Integers outside the i64 range (large unsigned values) become `Float`, so
// `get_int` on one reports a type mismatch rather than an overflow.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// Same integer rule as for JSON: beyond i64 the number is kept as `Float`.
impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

// YAML allows non-string keys (`1: one`, `true: yes`); they are addressed by
// their rendered form.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Value::from(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_numbers_keep_integers() {
        let json: serde_json::Value = serde_json::from_str(r#"{"i": 1, "f": 1.5}"#).unwrap();
        let value = Value::from(json);
        let map = value.as_mapping().unwrap();
        assert_eq!(map["i"], Value::Int(1));
        assert_eq!(map["f"], Value::Float(1.5));
    }

    #[test]
    fn test_integers_beyond_i64_are_floats() {
        let json: serde_json::Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(Value::from(json).kind(), Kind::Float);

        let yaml: serde_yaml::Value = serde_yaml::from_str("9223372036854775808").unwrap();
        assert_eq!(Value::from(yaml).kind(), Kind::Float);
    }

    #[test]
    fn test_yaml_non_string_keys_and_tags() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("1: one\ntrue: yes\ntagged: !custom 5\n").unwrap();
        let value = Value::from(yaml);
        let map = value.as_mapping().unwrap();
        assert_eq!(map["1"], Value::String("one".into()));
        assert_eq!(map["true"], Value::String("yes".into()));
        assert_eq!(map["tagged"], Value::Int(5));
    }

    #[test]
    fn test_normalize_keys_recurses_into_sequences() {
        let mut inner = Mapping::new();
        inner.insert("Name".into(), Value::String("Keep Case".into()));
        let mut outer = Mapping::new();
        outer.insert("Items".into(), Value::Sequence(vec![Value::Mapping(inner)]));

        let normalized = normalize_mapping(outer);
        let items = normalized["items"].as_sequence().unwrap();
        let first = items[0].as_mapping().unwrap();
        assert_eq!(first["name"], Value::String("Keep Case".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "");
        let seq = Value::Sequence(vec![Value::Int(1), Value::String("a".into())]);
        assert_eq!(seq.to_string(), r#"[1,"a"]"#);
    }
}
