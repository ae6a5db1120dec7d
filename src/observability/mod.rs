//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! source / settings / reload produce:
//!     → tracing events (load, merge, reload, watch)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout), or the host's own subscriber
//!     → whatever metrics recorder the host installs
//! ```

pub mod logging;
pub mod metrics;
