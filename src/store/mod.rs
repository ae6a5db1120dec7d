//! In-memory key/value store.
//!
//! # Data Flow
//! ```text
//! JSON/YAML text
//!     → serde_json / serde_yaml (parse)
//!     → value.rs (tagged Value, keys lower-cased)
//!     → tree.rs (merge over existing Store)
//!     → Store (dotted lookup, key listing, export, sub-store)
//! ```
//!
//! # Design Decisions
//! - Values are a closed sum type; accessors match on the variant
//! - A Store is a plain value; sharing and swapping happen one level up
//! - A key containing a literal '.' cannot be addressed distinctly

pub mod tree;
pub mod value;

pub use tree::{Store, KEY_DELIMITER};
pub use value::{Kind, Mapping, Value};
