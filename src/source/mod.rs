//! Source loading subsystem.
//!
//! # Data Flow
//! ```text
//! path (file or directory) / in-memory text
//!     → loader.rs (expand directory, read file, record source name)
//!     → format.rs (extension or content sniffing → JSON/YAML parse)
//!     → Store::merge (later sources override earlier ones)
//! ```
//!
//! # Design Decisions
//! - Directory scans are sorted by file name for a reproducible merge order
//! - Unsupported extensions inside a directory are skipped; given directly they fail
//! - First failure aborts the load; there are no retries

pub mod format;
pub mod loader;

pub use format::{Format, CONTENT_ORIGIN};
pub use loader::{list_supported_files, load, normalize, SourceSet};
