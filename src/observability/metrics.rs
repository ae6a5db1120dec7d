//! Load and reload metrics.
//!
//! # Metrics
//! - `settings_loads_total` (counter): file loads by outcome
//! - `settings_load_duration_seconds` (histogram): read + parse + merge time
//! - `settings_reloads_total` (counter): reloads by outcome and trigger
//! - `settings_reload_duration_seconds` (histogram): full rebuild time
//! - `settings_sources` (gauge): recorded source files on the last handle updated
//! - `settings_watch_events_total` (counter): file events forwarded to the reloader
//!
//! # Design Decisions
//! - Facade only; the host installs a recorder/exporter if it wants one
//! - Without a recorder every call is a no-op

use std::time::Instant;

pub fn record_load(outcome: &'static str, started: Instant) {
    ::metrics::counter!("settings_loads_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("settings_load_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str, trigger: &'static str, started: Instant) {
    ::metrics::counter!("settings_reloads_total", "outcome" => outcome, "trigger" => trigger)
        .increment(1);
    ::metrics::histogram!("settings_reload_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn record_sources(count: usize) {
    ::metrics::gauge!("settings_sources").set(count as f64);
}

pub fn record_watch_event() {
    ::metrics::counter!("settings_watch_events_total").increment(1);
}
