//! Watch tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for [`Settings::auto_reload_with`](crate::Settings::auto_reload_with).
///
/// Deserializable, so a host can keep it in its own settings and read it
/// with `get_as`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for platforms without native notifications.
    pub poll_interval_ms: u64,

    /// Quiet period after the first change before reloading; changes that
    /// arrive meanwhile are folded into the same reload.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            debounce_ms: 50,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
