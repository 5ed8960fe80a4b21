//! FIFO event queue.
//!
//! Accepts both externally-classified events and cascade events emitted by
//! handlers. Cascades are appended at the tail, so an event's cascades are
//! processed only after everything that was already queued ahead of them.

use {
    async_channel::{Receiver, Sender, unbounded},
    tracing::error,
};

use crate::sync::events::SyncEvent;

/// Unbounded FIFO queue of domain events.
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: Sender<SyncEvent>,
    receiver: Receiver<SyncEvent>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Appends one event at the tail.
    pub fn enqueue(&self, event: SyncEvent) {
        if let Err(e) = self.sender.try_send(event) {
            // Unbounded sends only fail when the queue is closed.
            error!("Event queue closed; dropping event: {}", e);
        }
    }

    /// Appends events at the tail, preserving their order.
    pub fn enqueue_many(&self, events: Vec<SyncEvent>) {
        for event in events {
            self.enqueue(event);
        }
    }

    /// Takes the next event, suspending until one is available.
    ///
    /// Returns `None` only when the queue has been closed.
    pub async fn take(&self) -> Option<SyncEvent> {
        self.receiver.recv().await.ok()
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::sync::{events::SyncEvent, queue::EventQueue};

    fn feed_sync(path: &str) -> SyncEvent {
        SyncEvent::FolderFeedSyncRequested {
            path: PathBuf::from(path),
        }
    }

    #[tokio::test]
    async fn test_fifo_order_including_enqueue_many() {
        let queue = EventQueue::new();
        queue.enqueue(feed_sync("/catalog/a"));
        queue.enqueue_many(vec![feed_sync("/catalog/b"), feed_sync("/catalog/c")]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.take().await, Some(feed_sync("/catalog/a")));
        assert_eq!(queue.take().await, Some(feed_sync("/catalog/b")));
        assert_eq!(queue.take().await, Some(feed_sync("/catalog/c")));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_cascades_land_behind_queued_events() {
        let queue = EventQueue::new();
        queue.enqueue(feed_sync("/catalog/first"));

        // A cascade appended while earlier events are pending waits its turn.
        queue.enqueue_many(vec![feed_sync("/catalog/cascade")]);
        assert_eq!(queue.take().await, Some(feed_sync("/catalog/first")));
        assert_eq!(queue.take().await, Some(feed_sync("/catalog/cascade")));
    }
}
