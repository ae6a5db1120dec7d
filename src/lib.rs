//! Layered JSON/YAML settings with typed accessors and live reload.
//!
//! ```no_run
//! use settings::Settings;
//!
//! # fn main() -> settings::Result<()> {
//! let settings = Settings::new("config/")?.merge("local.yaml")?;
//! let port = settings.get_int("server.port")?;
//! let timeout = settings.get_duration("server.timeout").unwrap_or_default();
//! settings.auto_reload()?;
//! # let _ = (port, timeout);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod observability;
pub mod reload;
pub mod settings;
pub mod source;
pub mod store;

pub use error::{Result, SettingsError};
pub use reload::{ReloadEvent, WatchConfig};
pub use settings::Settings;
pub use store::{Kind, Mapping, Value};
