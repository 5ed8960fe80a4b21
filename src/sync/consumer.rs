//! Serialized event dispatch.
//!
//! One registry lookup per event, one handler invocation at a time. The
//! single-flight consumer is the core correctness mechanism: physical
//! catalog writes are always serialized, so no two handlers can race on
//! the same feed document.

use std::{collections::HashMap, time::Instant};

use tracing::{debug, error, warn};

use crate::sync::{
    events::{EventKind, SyncEvent},
    handlers::EventHandler,
    queue::EventQueue,
};

/// Maps an event tag to the handler responsible for it.
///
/// Populated once at startup before the consumer loop starts; read-only
/// thereafter, so steady-state dispatch needs no locking.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Box<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for an event tag, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: Box<dyn EventHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Looks up the handler for an event tag.
    pub fn get(&self, kind: EventKind) -> Option<&dyn EventHandler> {
        self.handlers.get(&kind).map(Box::as_ref)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Single serialized consumer loop over the event queue.
pub struct EventConsumer {
    queue: EventQueue,
    registry: HandlerRegistry,
}

impl EventConsumer {
    /// Creates a consumer over `queue` dispatching through `registry`.
    pub fn new(queue: EventQueue, registry: HandlerRegistry) -> Self {
        Self { queue, registry }
    }

    /// Runs the consumer loop for the lifetime of the queue.
    ///
    /// The only suspension point is the queue take; handlers perform their
    /// blocking I/O within this task's turn.
    pub async fn run(self) {
        while let Some(event) = self.queue.take().await {
            self.dispatch(event);
        }
        debug!("Event queue closed; consumer loop exiting");
    }

    /// Dispatches one event to its handler and re-queues its cascades.
    ///
    /// Handler failures are logged and the event is dropped; the loop must
    /// keep running.
    pub(crate) fn dispatch(&self, event: SyncEvent) {
        let kind = event.kind();
        if kind == EventKind::Ignored {
            return;
        }

        let Some(handler) = self.registry.get(kind) else {
            warn!("No handler registered for {}; dropping event", kind.as_str());
            return;
        };

        let trace_id = event.trace_id();
        let started = Instant::now();
        match handler.handle(&event) {
            Ok(cascades) => {
                debug!(
                    event = %trace_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    cascades = cascades.len(),
                    "Event processed"
                );
                if !cascades.is_empty() {
                    self.queue.enqueue_many(cascades);
                }
            }
            Err(e) => {
                error!(
                    event = %trace_id,
                    path = %event.primary_path().unwrap_or_default().display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Handler failed; event dropped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use crate::{
        error::domain::SyncError,
        sync::{
            consumer::{EventConsumer, HandlerRegistry},
            events::{EventKind, SyncEvent},
            handlers::EventHandler,
            queue::EventQueue,
        },
    };

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        cascade: Option<SyncEvent>,
    }

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cascade.clone().into_iter().collect())
        }
    }

    struct FailingHandler;

    impl EventHandler for FailingHandler {
        fn handle(&self, _event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
            Err(SyncError::InvalidData {
                reason: "intentional".to_string(),
            })
        }
    }

    fn feed_sync(path: &str) -> SyncEvent {
        SyncEvent::FolderFeedSyncRequested {
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_cascades_are_requeued() {
        let queue = EventQueue::new();
        let mut registry = HandlerRegistry::new();
        registry.register(
            EventKind::FolderFeedSyncRequested,
            Box::new(CountingHandler {
                calls: Arc::new(AtomicUsize::new(0)),
                cascade: Some(feed_sync("/catalog/cascade")),
            }),
        );
        let consumer = EventConsumer::new(queue.clone(), registry);

        consumer.dispatch(feed_sync("/catalog/origin"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_handler_failure_does_not_stop_dispatch() {
        let queue = EventQueue::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(EventKind::FolderFeedSyncRequested, Box::new(FailingHandler));
        registry.register(
            EventKind::EntryDocumentChanged,
            Box::new(CountingHandler {
                calls: calls.clone(),
                cascade: None,
            }),
        );
        let consumer = EventConsumer::new(queue.clone(), registry);

        consumer.dispatch(feed_sync("/catalog/x"));
        consumer.dispatch(SyncEvent::EntryDocumentChanged {
            parent: PathBuf::from("/catalog/x/book.epub"),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The failing handler emitted no cascades.
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_missing_handler_drops_event() {
        let queue = EventQueue::new();
        let consumer = EventConsumer::new(queue.clone(), HandlerRegistry::new());

        consumer.dispatch(feed_sync("/catalog/x"));
        consumer.dispatch(SyncEvent::Ignored);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_run_drains_queue() {
        let queue = EventQueue::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(
            EventKind::FolderFeedSyncRequested,
            Box::new(CountingHandler {
                calls: calls.clone(),
                cascade: None,
            }),
        );
        let consumer = EventConsumer::new(queue.clone(), registry);

        queue.enqueue(feed_sync("/catalog/a"));
        queue.enqueue(feed_sync("/catalog/b"));

        let task = tokio::spawn(consumer.run());
        while calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        task.abort();
    }
}
