//! Configuration for watcher behavior.

/// Configuration for watcher behavior.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Whether to report hidden files and directories.
    pub include_hidden: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
        }
    }
}
