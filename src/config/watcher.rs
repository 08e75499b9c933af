//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Re-read the config file when it changes
//! - Forward the sections that apply without a restart as a [`ConfigReload`]
//!
//! # Design Decisions
//! - Only `thresholds`, `aliases` and `log` are reloaded. Listener, upstream,
//!   timeouts, observability and admin settings are bound at startup.
//! - Thresholds are forwarded only when the file's `[thresholds]` table
//!   differs from the previous load. Values set through `PUT
//!   /admin/thresholds` therefore survive unrelated edits to the file and are
//!   replaced once the operator edits the thresholds themselves.
//! - A file that fails to load, or is empty mid-write, keeps the current
//!   configuration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::{LargeHeadersConfig, LogConfig, ThresholdConfig};

/// The reloadable part of a changed config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReload {
    /// New thresholds, or `None` when the file left them unchanged.
    pub thresholds: Option<ThresholdConfig>,
    pub aliases: HashMap<String, String>,
    pub log: LogConfig,
}

impl ConfigReload {
    /// What changed between two successive loads of the file.
    pub fn between(previous: &LargeHeadersConfig, next: &LargeHeadersConfig) -> Self {
        Self {
            thresholds: (previous.thresholds != next.thresholds).then_some(next.thresholds),
            aliases: next.aliases.clone(),
            log: next.log.clone(),
        }
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    last_loaded: Arc<Mutex<LargeHeadersConfig>>,
    update_tx: mpsc::UnboundedSender<ConfigReload>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, whose content at startup was `initial`.
    ///
    /// Returns the watcher and a receiver for reloads.
    pub fn new(path: &Path, initial: LargeHeadersConfig) -> (Self, mpsc::UnboundedReceiver<ConfigReload>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                last_loaded: Arc::new(Mutex::new(initial)),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let last_loaded = self.last_loaded.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(reload) = reload_from(&path, &last_loaded) {
                        let _ = tx.send(reload);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read `path` and diff it against the last successful load.
fn reload_from(path: &Path, last_loaded: &Mutex<LargeHeadersConfig>) -> Option<ConfigReload> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Config file unreadable, keeping current configuration");
            return None;
        }
    };
    if content.trim().is_empty() {
        tracing::debug!(path = ?path, "Config file empty, waiting for the write to finish");
        return None;
    }

    match parse_config(&content) {
        Ok(next) => {
            let mut last = last_loaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let reload = ConfigReload::between(&last, &next);
            *last = next;
            tracing::info!(thresholds_changed = reload.thresholds.is_some(), "Config file change detected");
            Some(reload)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_file(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("largeheaders-watcher-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("largeheaders.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).unwrap_or_default();
        }
    }

    #[test]
    fn test_unchanged_thresholds_are_not_forwarded() {
        let previous = parse_config("[thresholds]\nlength_threshold = 100\n").unwrap();
        let next = parse_config(
            "[thresholds]\nlength_threshold = 100\n\n[aliases]\n\"/node/1\" = \"/about\"\n",
        )
        .unwrap();

        let reload = ConfigReload::between(&previous, &next);
        assert_eq!(reload.thresholds, None);
        assert_eq!(reload.aliases.get("/node/1").map(String::as_str), Some("/about"));
    }

    #[test]
    fn test_changed_thresholds_are_forwarded() {
        let previous = parse_config("[thresholds]\nlength_threshold = 100\n").unwrap();
        let next = parse_config("[thresholds]\nlength_threshold = 250\n").unwrap();

        let reload = ConfigReload::between(&previous, &next);
        assert_eq!(reload.thresholds.map(|t| t.length_threshold), Some(250));
    }

    #[test]
    fn test_reload_tracks_last_loaded_file() {
        let path = scratch_file("[thresholds]\nlength_threshold = 100\n");
        let last = Mutex::new(parse_config("[thresholds]\nlength_threshold = 100\n").unwrap());

        fs::write(&path, "[thresholds]\nlength_threshold = 300\n").unwrap();
        let first = reload_from(&path, &last).unwrap();
        assert_eq!(first.thresholds.map(|t| t.length_threshold), Some(300));

        // Same file again: nothing new for the thresholds.
        let second = reload_from(&path, &last).unwrap();
        assert_eq!(second.thresholds, None);
        cleanup(&path);
    }

    #[test]
    fn test_empty_or_invalid_file_keeps_current() {
        let path = scratch_file("");
        let last = Mutex::new(LargeHeadersConfig::default());
        assert!(reload_from(&path, &last).is_none());

        fs::write(&path, "[thresholds\n").unwrap();
        assert!(reload_from(&path, &last).is_none());

        fs::write(&path, "[upstream]\naddress = \"\"\n").unwrap();
        assert!(reload_from(&path, &last).is_none());
        assert!(last.lock().unwrap().upstream.is_none());
        cleanup(&path);
    }
}
