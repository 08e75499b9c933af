//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, thresholds coerced to integers)
//!     → validation.rs (semantic checks)
//!     → LargeHeadersConfig (validated, immutable)
//!     → shared.rs (ArcSwap handle read on every response event)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → ConfigReload (thresholds if changed, aliases, log)
//!     → shared.rs merges it into the live config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes swap a whole new value
//! - Thresholds set through the admin endpoint outlive file edits that leave
//!   `[thresholds]` untouched
//! - All fields have defaults to allow minimal configs
//! - Malformed thresholds are coerced, never rejected

pub mod loader;
pub mod schema;
pub mod shared;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{LargeHeadersConfig, LogConfig, ThresholdConfig};
pub use shared::SharedConfig;
