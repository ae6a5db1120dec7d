//! Typed accessors.
//!
//! Every accessor runs the same checks in order: reload failure, presence,
//! variant. Errors are tagged with the accessor's name. Callers wanting the
//! zero value on failure use `unwrap_or_default()`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::{Result, SettingsError};
use crate::settings::Settings;
use crate::store::{Kind, Mapping, Value};

/// Key label used when the whole tree is extracted.
const ROOT_KEY: &str = "<root>";

impl Settings {
    fn read<T>(
        &self,
        key: &str,
        op: &'static str,
        convert: impl FnOnce(&Value) -> Result<T>,
    ) -> Result<T> {
        self.ensure_healthy(op)?;
        let store = self.shared.store.load();
        let value = store
            .find(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| SettingsError::NotFound { key: key.to_string() }.during(op))?;
        convert(value).map_err(|e| e.during(op))
    }

    fn typed<T>(
        &self,
        key: &str,
        op: &'static str,
        want: Kind,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T> {
        self.read(key, op, |value| {
            convert(value).ok_or_else(|| mismatch(key, want, value))
        })
    }

    /// The raw value under `key`; only presence is checked.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.read(key, "get", |value| Ok(value.clone()))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.typed(key, "get_bool", Kind::Bool, Value::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.typed(key, "get_int", Kind::Int, Value::as_i64)
    }

    /// Only float values qualify; an integer such as `8080` is a mismatch.
    pub fn get_float64(&self, key: &str) -> Result<f64> {
        self.typed(key, "get_float64", Kind::Float, Value::as_f64)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.typed(key, "get_string", Kind::String, |v| v.as_str().map(str::to_owned))
    }

    /// Elements are rendered as strings, whatever their variant.
    pub fn get_string_slice(&self, key: &str) -> Result<Vec<String>> {
        self.typed(key, "get_string_slice", Kind::Sequence, |v| {
            v.as_sequence()
                .map(|items| items.iter().map(ToString::to_string).collect())
        })
    }

    /// Every element must itself be an integer.
    pub fn get_int_slice(&self, key: &str) -> Result<Vec<i64>> {
        self.read(key, "get_int_slice", |value| {
            let items = value
                .as_sequence()
                .ok_or_else(|| mismatch(key, Kind::Sequence, value))?;
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_i64().ok_or_else(|| SettingsError::ElementMismatch {
                        key: key.to_string(),
                        index,
                        got: item.kind(),
                    })
                })
                .collect()
        })
    }

    pub fn get_string_map(&self, key: &str) -> Result<Mapping> {
        self.typed(key, "get_string_map", Kind::Mapping, |v| v.as_mapping().cloned())
    }

    pub fn get_string_map_string(&self, key: &str) -> Result<BTreeMap<String, String>> {
        self.typed(key, "get_string_map_string", Kind::Mapping, |v| {
            v.as_mapping().map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect()
            })
        })
    }

    /// An integer count of seconds since the Unix epoch, as UTC.
    pub fn get_time(&self, key: &str) -> Result<DateTime<Utc>> {
        self.read(key, "get_time", |value| {
            let secs = value.as_i64().ok_or_else(|| mismatch(key, Kind::Int, value))?;
            DateTime::from_timestamp(secs, 0).ok_or_else(|| SettingsError::OutOfRange {
                key: key.to_string(),
                value: secs,
            })
        })
    }

    /// A non-negative integer count of seconds.
    pub fn get_duration(&self, key: &str) -> Result<Duration> {
        self.read(key, "get_duration", |value| {
            let secs = value.as_i64().ok_or_else(|| mismatch(key, Kind::Int, value))?;
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| SettingsError::OutOfRange {
                    key: key.to_string(),
                    value: secs,
                })
        })
    }

    /// Whether `key` resolves to a non-null value. Fails only after a
    /// failed reload.
    pub fn is_set(&self, key: &str) -> Result<bool> {
        self.ensure_healthy("is_set")?;
        Ok(self.shared.store.load().is_set(key))
    }

    /// Every leaf key holding a value, dotted, lower-case and sorted.
    pub fn all_keys(&self) -> Result<Vec<String>> {
        self.ensure_healthy("all_keys")?;
        Ok(self.shared.store.load().all_keys())
    }

    pub fn all_settings(&self) -> Result<Mapping> {
        self.ensure_healthy("all_settings")?;
        Ok(self.shared.store.load().all_settings())
    }

    /// Deserialize the value under `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.read(key, "get_as", |value| deserialize(key, value))
    }

    /// Deserialize the whole tree into `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T> {
        self.ensure_healthy("extract")?;
        let tree = Value::Mapping(self.shared.store.load().all_settings());
        deserialize(ROOT_KEY, &tree).map_err(|e| e.during("extract"))
    }
}

fn mismatch(key: &str, want: Kind, found: &Value) -> SettingsError {
    SettingsError::TypeMismatch {
        key: key.to_string(),
        want,
        got: found.kind(),
    }
}

fn deserialize<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|source| SettingsError::Extract {
            key: key.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const CONTENT: &str = r#"
service:
  name: ExampleService
  enabled: true
  ratio: 0.75
  port: 8080
  tags: [web, 1, true]
  ids: [1, 2, 0, 4]
  mixed: [1, two, 3]
  started: 1700000000
  timeout: 30
  negative: -5
  labels:
    tier: gold
    weight: 3
"#;

    fn settings() -> Settings {
        Settings::from_content(CONTENT).unwrap()
    }

    #[test]
    fn test_scalars() {
        let s = settings();
        assert_eq!(s.get_string("service.name").unwrap(), "ExampleService");
        assert!(s.get_bool("service.enabled").unwrap());
        assert_eq!(s.get_float64("service.ratio").unwrap(), 0.75);
        assert_eq!(s.get_int("service.port").unwrap(), 8080);
        assert_eq!(s.get("SERVICE.Name").unwrap(), Value::String("ExampleService".into()));
    }

    #[test]
    fn test_type_mismatch_reports_both_kinds() {
        let s = settings();
        let err = s.get_string("service.port").unwrap_err();
        assert_eq!(
            err.to_string(),
            "settings.get_string :: the value of key: service.port :: should be type: string, not: int"
        );
        assert!(s.get_float64("service.port").is_err());
        assert!(s.get_int("service.ratio").is_err());
        assert!(s.get_bool("service.name").is_err());
        assert!(s.get_string_map("service.name").is_err());
        assert_eq!(s.get_int("service.name").unwrap_or_default(), 0);
    }

    #[test]
    fn test_missing_key() {
        let err = settings().get_bool("key.not.exists").unwrap_err();
        assert_eq!(
            err.to_string(),
            "settings.get_bool :: key.not.exists :: cannot find value in configuration"
        );
        assert!(!settings().is_set("key.not.exists").unwrap());
    }

    #[test]
    fn test_slices() {
        let s = settings();
        assert_eq!(s.get_int_slice("service.ids").unwrap(), vec![1, 2, 0, 4]);
        assert_eq!(
            s.get_string_slice("service.tags").unwrap(),
            vec!["web".to_string(), "1".to_string(), "true".to_string()]
        );

        let err = s.get_int_slice("service.mixed").unwrap_err();
        assert!(matches!(
            err.root(),
            SettingsError::ElementMismatch { index: 1, got: Kind::String, .. }
        ));
        assert!(err.to_string().contains("should be type: []int"));

        let err = s.get_int_slice("service.name").unwrap_err();
        assert!(matches!(err.root(), SettingsError::TypeMismatch { want: Kind::Sequence, .. }));
    }

    #[test]
    fn test_maps() {
        let s = settings();
        let labels = s.get_string_map("service.labels").unwrap();
        assert_eq!(labels["weight"], Value::Int(3));

        let labels = s.get_string_map_string("service.labels").unwrap();
        assert_eq!(labels["tier"], "gold");
        assert_eq!(labels["weight"], "3");
    }

    #[test]
    fn test_time_and_duration_are_seconds() {
        let s = settings();
        assert_eq!(s.get_time("service.started").unwrap().timestamp(), 1_700_000_000);
        assert_eq!(s.get_duration("service.timeout").unwrap(), Duration::from_secs(30));

        let err = s.get_duration("service.negative").unwrap_err();
        assert!(matches!(err.root(), SettingsError::OutOfRange { value: -5, .. }));
        assert!(s.get_time("service.name").is_err());
    }

    #[test]
    fn test_all_keys_and_settings() {
        let s = Settings::from_content(r#"{"a": {"b": {"c": [1, 2, 0, 4]}}, "d": "x"}"#).unwrap();
        assert_eq!(s.all_keys().unwrap(), vec!["a.b.c".to_string(), "d".to_string()]);

        let all = s.all_settings().unwrap();
        assert_eq!(all["d"], Value::String("x".into()));
    }

    #[test]
    fn test_extract() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Labels {
            tier: String,
            weight: u32,
        }

        let s = settings();
        let labels: Labels = s.get_as("service.labels").unwrap();
        assert_eq!(
            labels,
            Labels {
                tier: "gold".into(),
                weight: 3
            }
        );

        let err = s.get_as::<Labels>("service.name").unwrap_err();
        assert!(err.to_string().starts_with("settings.get_as :: the value of key: service.name"));

        let tree: serde_json::Value = s.extract().unwrap();
        assert_eq!(tree["service"]["port"], 8080);
    }
}
