//! Watch-triggered reloads.

use std::time::Duration;

use settings::{ReloadEvent, Settings, SettingsError, Value, WatchConfig};

mod common;

use common::{next_reload, Fixture, APP_YAML, OTHER_YAML};

const WAIT: Duration = Duration::from_secs(10);

fn fast_watch() -> WatchConfig {
    WatchConfig {
        poll_interval_ms: 100,
        debounce_ms: 20,
    }
}

#[tokio::test]
async fn test_file_change_reloads_whole_handle() {
    let fixture = Fixture::new();
    let other = fixture.write("other.yaml", OTHER_YAML);

    let settings = Settings::from_content(APP_YAML).unwrap().merge(&other).unwrap();
    let mut events = settings.subscribe();
    settings.auto_reload_with(fast_watch()).unwrap();

    fixture.write("other.yaml", &OTHER_YAML.replace("int: 1", "int: 1000"));

    loop {
        match next_reload(&mut events, WAIT).await {
            ReloadEvent::Reloaded { trigger } => {
                assert!(trigger.unwrap().ends_with("other.yaml"));
                if settings.get_int("other.content.int").ok() == Some(1000) {
                    break;
                }
            }
            ReloadEvent::Failed { error, .. } => panic!("reload failed: {}", error),
        }
    }

    assert_eq!(
        settings.get("service.name").unwrap(),
        Value::String("ExampleService".into())
    );
}

#[tokio::test]
async fn test_successive_changes_are_observed() {
    let fixture = Fixture::new();
    let file = fixture.write("example_config.yaml", "config:\n  key: value\n");

    let settings = Settings::new(&file).unwrap();
    let mut events = settings.subscribe();
    settings.auto_reload_with(fast_watch()).unwrap();
    assert_eq!(settings.get_string("config.key").unwrap(), "value");

    fixture.write("example_config.yaml", "config:\n  foo: bar\n");
    while !settings.is_set("config.foo").unwrap() {
        next_reload(&mut events, WAIT).await;
    }
    assert_eq!(settings.get_string("config.foo").unwrap(), "bar");
    assert!(!settings.is_set("config.key").unwrap());

    fixture.write("example_config.yaml", "config:\n  key: value\n");
    while !settings.is_set("config.key").unwrap() {
        next_reload(&mut events, WAIT).await;
    }
    assert_eq!(settings.get_string("config.key").unwrap(), "value");
}

#[tokio::test]
async fn test_each_source_is_watched() {
    let fixture = Fixture::new();
    let first = fixture.write("a/one.yaml", "one: 1\n");
    let second = fixture.write("b/two.yaml", "two: 2\n");

    let settings = Settings::new(&first).unwrap().merge(&second).unwrap();
    let mut events = settings.subscribe();
    settings.auto_reload_with(fast_watch()).unwrap();

    fixture.write("b/two.yaml", "two: 22\n");
    while settings.get_int("two").ok() != Some(22) {
        next_reload(&mut events, WAIT).await;
    }
    assert_eq!(settings.get_int("one").unwrap(), 1);

    fixture.write("a/one.yaml", "one: 11\n");
    while settings.get_int("one").ok() != Some(11) {
        next_reload(&mut events, WAIT).await;
    }
    assert_eq!(settings.get_int("two").unwrap(), 22);
}

#[tokio::test]
async fn test_malformed_change_fails_handle_and_stops_watch() {
    let fixture = Fixture::new();
    let file = fixture.write("app.json", r#"{"app": {"bool": true}}"#);

    let settings = Settings::new(&file).unwrap();
    let mut events = settings.subscribe();
    settings.auto_reload_with(fast_watch()).unwrap();

    fixture.write("app.json", "{ broken");
    let error = loop {
        if let ReloadEvent::Failed { trigger, error } = next_reload(&mut events, WAIT).await {
            assert!(trigger.unwrap().ends_with("app.json"));
            break error;
        }
    };
    assert!(error.contains("app.json"));

    assert!(settings.is_set("app.bool").is_err());
    let err = settings.get_bool("app.bool").unwrap_err();
    assert!(matches!(err.root(), SettingsError::Json { .. }));

    // The coordinator stopped, so a fixed file is not picked up.
    fixture.write("app.json", r#"{"app": {"bool": false}}"#);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(events.try_recv().is_err());
    assert!(settings.failure().is_some());
}
