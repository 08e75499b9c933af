//! Size-capped diagnostic log file with a single backup generation.
//!
//! # Responsibilities
//! - Locate `largeheaders.log` in a writable temp directory
//! - Rotate to `largeheaders.log.1` once the file exceeds the ceiling
//! - Append records
//!
//! # Design Decisions
//! - Best-effort: every filesystem error is swallowed by `append_to_log`
//! - Only one backup generation; rotation overwrites the previous backup
//! - Rotate-then-append is serialized within the process

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::inspect::TempDirLocator;
use crate::observability::metrics;

/// File name of the active log inside the temp directory.
pub const LOG_FILE_NAME: &str = "largeheaders.log";

/// Size in bytes above which the log is rotated before the next write.
pub const MAX_LOG_SIZE: u64 = 512_000;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to rotate {path}: {source}")]
    Rotate { path: PathBuf, source: io::Error },
    #[error("failed to append to {path}: {source}")]
    Append { path: PathBuf, source: io::Error },
}

/// Appends records to the diagnostic log, rotating as needed.
pub struct LogRotator {
    locator: Arc<dyn TempDirLocator>,
    max_size: u64,
    write_lock: Mutex<()>,
}

impl LogRotator {
    pub fn new(locator: Arc<dyn TempDirLocator>) -> Self {
        Self::with_max_size(locator, MAX_LOG_SIZE)
    }

    pub fn with_max_size(locator: Arc<dyn TempDirLocator>, max_size: u64) -> Self {
        Self {
            locator,
            max_size,
            write_lock: Mutex::new(()),
        }
    }

    /// `<tempdir>/largeheaders.log`, or `None` if the directory is unusable.
    pub fn resolve_log_file_location(&self) -> Option<PathBuf> {
        let dir = self.locator.temp_dir()?;
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Some(dir.join(LOG_FILE_NAME)),
            _ => None,
        }
    }

    /// Append `data` to the log. Never fails; returns whether it was written.
    pub fn append_to_log(&self, data: &str) -> bool {
        let Some(path) = self.resolve_log_file_location() else {
            tracing::debug!("No usable temp directory, skipping large header log write");
            return false;
        };

        match self.append(&path, data) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Large header log write failed");
                metrics::record_log_write_failure();
                false
            }
        }
    }

    /// Append to `path`, rotating first when it is over the ceiling.
    ///
    /// A failed rotation does not prevent the append.
    pub fn append(&self, path: &Path, data: &str) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.should_rotate(path) {
            match self.rotate(path) {
                Ok(()) => metrics::record_log_rotation(),
                Err(e) => tracing::debug!(error = %e, "Large header log rotation failed"),
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(data.as_bytes()))
            .map_err(|source| LogError::Append {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Move `path` to `path.1`, replacing any earlier backup.
    pub fn rotate(&self, path: &Path) -> Result<(), LogError> {
        let rotated = rotated_path(path);
        if rotated.exists() {
            // Best-effort; the rename below reports the real failure.
            let _ = fs::remove_file(&rotated);
        }
        fs::rename(path, &rotated).map_err(|source| LogError::Rotate {
            path: path.to_path_buf(),
            source,
        })
    }

    fn should_rotate(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|meta| meta.len() > self.max_size)
            .unwrap_or(false)
    }
}

/// Backup path for a log file: the same name with `.1` appended.
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".1");
    PathBuf::from(name)
}
