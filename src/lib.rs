//! Large response header detection for HTTP services.
//!
//! Flags responses whose headers are individually too long, too large in
//! total, or too numerous, and records each one to a size-capped rotating
//! log file and the `largeheaders` tracing target.

pub mod admin;
pub mod config;
pub mod http;
pub mod inspect;
pub mod lifecycle;
pub mod observability;

pub use config::{LargeHeadersConfig, SharedConfig};
pub use http::HttpServer;
pub use inspect::{Inspection, ResponseEvent, ResponseInspector};
pub use lifecycle::Shutdown;
