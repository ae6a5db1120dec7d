//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use settings::ReloadEvent;
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const APP_YAML: &str = "\
service:
  name: ExampleService
  port: 8080
email:
  to: user@gmail.com
  server:
    port: 25
a:
  b:
    c: [1, 2, 0, 4]
";

pub const OTHER_JSON: &str = r#"{"other": {"content": {"int": 1, "string": "text", "bool": true}}}"#;

pub const OTHER_YAML: &str = "\
other:
  content:
    int: 1
    string: text
    bool: true
";

/// A scratch settings directory, removed on drop.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = settings::observability::logging::init("settings=debug");
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name` under the fixture directory.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

/// Wait for the next reload event, failing the test after `timeout`.
pub async fn next_reload(
    events: &mut broadcast::Receiver<ReloadEvent>,
    timeout: Duration,
) -> ReloadEvent {
    tokio::time::timeout(timeout, events.recv())
        .await
        .expect("timed out waiting for a reload")
        .expect("reload event channel closed")
}
