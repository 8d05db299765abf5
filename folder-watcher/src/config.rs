//! Configuration types for folder watching.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default quiet period before a burst of events is reported.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Configuration for a [`FolderWatchManager`](crate::FolderWatchManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Whether each folder is watched recursively.
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl WatchConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            recursive: true,
        }
    }

    /// Set the quiet period.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Watch only the top level of each folder.
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// Quiet period as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn recursive_mode(&self) -> notify::RecursiveMode {
        if self.recursive {
            notify::RecursiveMode::Recursive
        } else {
            notify::RecursiveMode::NonRecursive
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_watch_config_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.recursive);
    }

    #[test]
    fn test_watch_config_builder() {
        let config = WatchConfig::new()
            .with_debounce(Duration::from_millis(120))
            .non_recursive();

        assert_eq!(config.debounce_ms, 120);
        assert_eq!(config.recursive_mode(), notify::RecursiveMode::NonRecursive);
    }

    #[test]
    fn test_watch_config_missing_fields_use_defaults() {
        let config: WatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, WatchConfig::default());
    }
}
