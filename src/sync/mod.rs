//! Event-driven catalog synchronization engine.
//!
//! Raw watcher notifications are classified into domain events,
//! deduplicated, and drained by a single serialized consumer whose handlers
//! mutate the catalog tree and emit cascade events, rippling changes upward
//! through the folder hierarchy until the catalog is consistent again.

use std::sync::Arc;

use {
    async_channel::{Receiver, bounded},
    tokio::{spawn, task::JoinHandle},
    tracing::{debug, info},
};

use crate::{
    catalog::paths::CatalogLayout,
    config::UserSettings,
    error::domain::SyncError,
    metadata::ExtractorRegistry,
};

pub mod bulk;
pub mod classifier;
pub mod consumer;
pub mod dedup;
pub mod events;
pub mod handlers;
pub mod queue;
pub mod watcher;

pub use {
    classifier::classify,
    consumer::{EventConsumer, HandlerRegistry},
    dedup::{DedupConfig, Deduplicator},
    events::{EventKind, SyncEvent},
    queue::EventQueue,
    watcher::{CatalogWatcher, ChangeFlags, RawNotification, WatchOrigin, WatcherConfig},
};

use crate::sync::handlers::{SyncContext, register_default_handlers};

/// Configuration for the synchronization engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Duplicate suppression configuration.
    pub dedup: DedupConfig,
    /// Watcher configuration.
    pub watcher: WatcherConfig,
    /// Capacity of the raw notification channel.
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            watcher: WatcherConfig::default(),
            channel_capacity: 1024,
        }
    }
}

impl SyncConfig {
    /// Derives the engine configuration from user settings.
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            dedup: DedupConfig {
                window_ms: settings.dedup_window_ms,
                max_entries: settings.dedup_max_entries,
            },
            watcher: WatcherConfig::default(),
            channel_capacity: settings.watch_channel_capacity,
        }
    }
}

/// Main synchronization coordinator.
///
/// Owns the watcher, the ingest task (classification plus deduplication),
/// and the single consumer loop. Dropping it shuts the engine down.
pub struct CatalogSync {
    /// File system watcher; must stay alive for notifications to flow.
    _watcher: CatalogWatcher,
    /// Shared event queue.
    queue: EventQueue,
    /// Shared handler services.
    context: Arc<SyncContext>,
    /// Consumer loop task, awaited by [`CatalogSync::run`].
    consumer_task: Option<JoinHandle<()>>,
    /// Ingest task handle.
    _tasks: Vec<JoinHandle<()>>,
}

impl CatalogSync {
    /// Creates the engine and starts watching both trees.
    ///
    /// The handler registry is populated here, before the consumer loop
    /// starts; it is read-only from then on.
    ///
    /// # Arguments
    ///
    /// * `layout` - Source/catalog tree layout.
    /// * `extractors` - Per-format metadata extractors.
    /// * `config` - Optional configuration (uses defaults if None).
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the watcher cannot be initialized.
    pub fn new(
        layout: CatalogLayout,
        extractors: ExtractorRegistry,
        config: Option<SyncConfig>,
    ) -> Result<Self, SyncError> {
        let config = config.unwrap_or_default();

        let (raw_sender, raw_receiver) = bounded(config.channel_capacity);
        let mut watcher =
            CatalogWatcher::new(layout.clone(), raw_sender, Some(config.watcher.clone()))?;
        watcher.watch_roots()?;

        let queue = EventQueue::new();
        let dedup = Deduplicator::new(config.dedup.clone());

        let mut tasks = Vec::new();
        let ingest_queue = queue.clone();
        tasks.push(spawn(async move {
            Self::ingest_loop(raw_receiver, dedup, ingest_queue).await;
        }));

        let context = SyncContext::new(layout, extractors);
        let mut registry = HandlerRegistry::new();
        register_default_handlers(&mut registry, &context);
        let consumer_task = spawn(EventConsumer::new(queue.clone(), registry).run());

        Ok(Self {
            _watcher: watcher,
            queue,
            context,
            consumer_task: Some(consumer_task),
            _tasks: tasks,
        })
    }

    /// Classifies and deduplicates raw notifications into the queue.
    async fn ingest_loop(
        receiver: Receiver<RawNotification>,
        dedup: Deduplicator,
        queue: EventQueue,
    ) {
        while let Ok(notification) = receiver.recv().await {
            let event = classify(&notification);
            if event.kind() == EventKind::Ignored {
                debug!(
                    "Ignoring notification for {} ({})",
                    notification.name, notification.flags
                );
                continue;
            }
            if !dedup.should_process(&event.dedup_key()) {
                continue;
            }
            queue.enqueue(event);
        }
    }

    /// Queues a full reconciliation of the catalog against the source tree.
    ///
    /// The batch bypasses deduplication and lands ahead of any live
    /// watcher events still to come.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the source root cannot be read.
    pub fn bulk_sync(&self) -> Result<usize, SyncError> {
        let events = bulk::plan_bulk_sync(&self.context.layout)?;
        let count = events.len();
        self.queue.enqueue_many(events);
        info!("Bulk sync queued {} events", count);
        Ok(count)
    }

    /// Shared event queue (for tests and embedding hosts).
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Runs until the consumer loop ends; in practice, for the process
    /// lifetime. A host shuts the engine down by dropping this future.
    pub async fn run(mut self) {
        if let Some(task) = self.consumer_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for CatalogSync {
    fn drop(&mut self) {
        if let Some(task) = &self.consumer_task {
            task.abort();
        }
        for task in &self._tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{create_dir_all, read_to_string, write},
        time::Duration,
    };

    use {
        tempfile::tempdir,
        tokio::time::{sleep, timeout},
    };

    use crate::{
        catalog::paths::{BOOK_ENTRY_DOC, CatalogLayout, FEED_DOC},
        metadata::ExtractorRegistry,
        sync::{CatalogSync, SyncConfig},
    };

    #[tokio::test]
    async fn test_bulk_sync_drains_into_consistent_catalog() {
        let source = tempdir().unwrap();
        let catalog = tempdir().unwrap();
        create_dir_all(source.path().join("Fiction")).unwrap();
        write(source.path().join("Fiction/book.epub"), b"bytes").unwrap();

        let layout = CatalogLayout::new(source.path(), catalog.path());
        let sync = CatalogSync::new(layout, ExtractorRegistry::new(), Some(SyncConfig::default()))
            .unwrap();
        let queued = sync.bulk_sync().unwrap();
        assert!(queued >= 4); // folder + book + two feed syncs

        let book_entry = catalog.path().join("Fiction/book.epub").join(BOOK_ENTRY_DOC);
        timeout(Duration::from_secs(5), async {
            while !book_entry.is_file() || !catalog.path().join(FEED_DOC).is_file() {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("catalog did not converge");

        let root_feed = read_to_string(catalog.path().join(FEED_DOC)).unwrap();
        assert!(root_feed.contains("<title>Fiction</title>"));
    }
}
