//! Large response header detection.
//!
//! # Data Flow
//! ```text
//! ResponseEvent (request method/path/headers + response headers)
//!     → inspector.rs (reads thresholds from a ThresholdProvider)
//!     → analyzer.rs (reasons + serialized header block)
//!     → [flagged] identity.rs (correlation id or timestamp hash, alias lookup)
//!     → rotator.rs (append to largeheaders.log, rotate to .1 when too big)
//!     → tracing event on the `largeheaders` target
//! ```
//!
//! # Design Decisions
//! - Passive observer: nothing here can fail a response
//! - Collaborators are traits so threshold logic tests need no filesystem
//! - File log and tracing event are independent sinks

use std::path::PathBuf;

use crate::config::ThresholdConfig;

pub mod analyzer;
pub mod identity;
pub mod inspector;
pub mod rotator;

pub use analyzer::{analyze, AnalysisResult, HeaderSet, Reason};
pub use identity::{RequestIdentity, RequestInfo, CORRELATION_HEADER};
pub use inspector::{format_record, Inspection, ResponseEvent, ResponseInspector};
pub use rotator::{LogError, LogRotator, LOG_FILE_NAME, MAX_LOG_SIZE};

/// Source of the current detection thresholds.
pub trait ThresholdProvider: Send + Sync {
    fn thresholds(&self) -> ThresholdConfig;
}

/// Maps a physical request path to its logical alias.
pub trait AliasResolver: Send + Sync {
    /// Returns the alias, or `path` itself when there is none.
    fn resolve_alias(&self, path: &str) -> String;
}

/// Finds a writable directory for the diagnostic log.
pub trait TempDirLocator: Send + Sync {
    fn temp_dir(&self) -> Option<PathBuf>;
}
