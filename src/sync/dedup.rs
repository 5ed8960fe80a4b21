//! Duplicate notification suppression.
//!
//! Filesystem watchers frequently deliver several notifications for one
//! logical change (a single write can raise both a metadata and a content
//! signal). The deduplicator suppresses repeats of the same event key
//! within a short window so handlers run once per logical change.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use {parking_lot::Mutex, tracing::debug};

/// Configuration for duplicate suppression.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Suppression window for repeated keys.
    pub window_ms: u64,
    /// Size threshold above which stale entries are evicted.
    pub max_entries: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_ms: 500,
            max_entries: 4096,
        }
    }
}

/// Suppresses repeated event keys within a time window.
///
/// The table is touched from the notification-receiving task, which may not
/// be the consumer's, so access goes through a mutex guarding only the
/// read-modify-write; it is never held across I/O.
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    max_entries: usize,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Deduplicator {
    /// Creates a deduplicator from configuration.
    pub fn new(config: DedupConfig) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max_entries: config.max_entries,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Single check-and-set: returns whether the key should be processed.
    ///
    /// A suppressed hit does not refresh the stored timestamp, so a steady
    /// stream of duplicates still lets one through per window.
    pub fn should_process(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock();

        if let Some(last) = seen.get(key)
            && now.duration_since(*last) < self.window
        {
            debug!("Suppressing duplicate notification: {}", key);
            return false;
        }

        // Housekeeping, not correctness: duplicate processing past the
        // window is safe because handlers are idempotent.
        if seen.len() >= self.max_entries {
            let cutoff = self.window * 10;
            seen.retain(|_, last| now.duration_since(*last) <= cutoff);
        }

        seen.insert(key.to_string(), now);
        true
    }

    /// Number of tracked keys (for tests and diagnostics).
    pub fn tracked(&self) -> usize {
        self.seen.lock().len()
    }
}
