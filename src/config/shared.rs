//! Live configuration shared between the server, the admin endpoint and the
//! header inspector.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::{LargeHeadersConfig, ThresholdConfig};
use crate::config::watcher::ConfigReload;
use crate::inspect::{AliasResolver, TempDirLocator, ThresholdProvider};

/// Atomically swappable configuration handle.
///
/// Cloning is cheap; all clones observe the same configuration.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<LargeHeadersConfig>>,
}

impl SharedConfig {
    pub fn new(config: LargeHeadersConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Snapshot of the current configuration.
    pub fn load(&self) -> Arc<LargeHeadersConfig> {
        self.inner.load_full()
    }

    /// Replace the whole configuration.
    pub fn store(&self, config: LargeHeadersConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Replace only the thresholds, keeping everything else.
    pub fn set_thresholds(&self, thresholds: ThresholdConfig) {
        self.inner.rcu(|current| {
            let mut next = (**current).clone();
            next.thresholds = thresholds;
            next
        });
    }

    /// Apply a file reload. Thresholds are only replaced when the file changed
    /// them, so an admin override stays until the file's thresholds move.
    pub fn apply_reload(&self, reload: &ConfigReload) {
        self.inner.rcu(|current| {
            let mut next = (**current).clone();
            if let Some(thresholds) = reload.thresholds {
                next.thresholds = thresholds;
            }
            next.aliases = reload.aliases.clone();
            next.log = reload.log.clone();
            next
        });
    }
}

impl ThresholdProvider for SharedConfig {
    fn thresholds(&self) -> ThresholdConfig {
        self.inner.load().thresholds
    }
}

impl AliasResolver for SharedConfig {
    fn resolve_alias(&self, path: &str) -> String {
        self.inner
            .load()
            .aliases
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }
}

impl TempDirLocator for SharedConfig {
    /// The configured log directory, else the system temp directory.
    fn temp_dir(&self) -> Option<PathBuf> {
        let configured = self.inner.load().log.directory.clone();
        Some(configured.map(PathBuf::from).unwrap_or_else(std::env::temp_dir))
    }
}
