//! Structured logging.
//!
//! # Responsibilities
//! - Initialize a logging subscriber for hosts and tests that have none
//! - Honour `RUST_LOG`, falling back to a caller-supplied directive
//!
//! # Design Decisions
//! - The library only emits `tracing` events; installing a subscriber is opt-in
//! - Fails instead of replacing an already installed global subscriber

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used by [`init_default`].
pub const DEFAULT_DIRECTIVE: &str = "settings=info";

/// Install a global fmt subscriber filtered by `RUST_LOG` or `default_directive`.
pub fn init(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

pub fn init_default() -> Result<(), TryInitError> {
    init(DEFAULT_DIRECTIVE)
}
