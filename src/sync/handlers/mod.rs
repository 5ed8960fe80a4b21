//! Event handlers mutating the catalog tree.
//!
//! One handler per event tag. Each handler mutates the catalog tree and
//! returns zero or more cascade events for the consumer to re-queue. A
//! handler invoked with an event tag it does not own returns no cascades,
//! which keeps the dispatch table flat with no per-tag narrowing at the
//! call site.

use std::{
    fs::remove_dir_all,
    io::ErrorKind::NotFound,
    path::Path,
    sync::Arc,
};

use crate::{
    catalog::paths::CatalogLayout,
    error::domain::{CatalogError, SyncError},
    metadata::ExtractorRegistry,
    sync::{
        consumer::HandlerRegistry,
        events::{EventKind, SyncEvent},
    },
};

mod book;
mod feed;
mod folder;
mod propagation;

pub use {
    book::{BookCreatedHandler, BookDeletedHandler},
    feed::FeedSyncHandler,
    folder::{FolderCreatedHandler, FolderDeletedHandler},
    propagation::{EntryChangedHandler, FolderEntryChangedHandler},
};

/// Handler for one event tag.
pub trait EventHandler: Send + Sync {
    /// Processes the event, returning cascade events to re-queue.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` for unexpected failures; foreseeable conditions
    /// (missing source, missing metadata, already-deleted target) are
    /// handled locally and never abort the consumer loop.
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError>;
}

/// Shared services handed to every handler at construction.
pub struct SyncContext {
    /// Source/catalog tree layout.
    pub layout: CatalogLayout,
    /// Per-format metadata extractors.
    pub extractors: ExtractorRegistry,
}

impl SyncContext {
    /// Creates a shared context.
    pub fn new(layout: CatalogLayout, extractors: ExtractorRegistry) -> Arc<Self> {
        Arc::new(Self { layout, extractors })
    }
}

/// Registers the handler for every event tag the engine produces.
pub fn register_default_handlers(registry: &mut HandlerRegistry, context: &Arc<SyncContext>) {
    registry.register(
        EventKind::BookCreated,
        Box::new(BookCreatedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::BookDeleted,
        Box::new(BookDeletedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::FolderCreated,
        Box::new(FolderCreatedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::FolderDeleted,
        Box::new(FolderDeletedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::EntryDocumentChanged,
        Box::new(EntryChangedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::FolderEntryDocumentChanged,
        Box::new(FolderEntryChangedHandler::new(context.clone())),
    );
    registry.register(
        EventKind::FolderFeedSyncRequested,
        Box::new(FeedSyncHandler::new(context.clone())),
    );
}

/// Recursively removes a catalog directory, treating an already-absent
/// target as success. Deletions are inherently racy with prior deletions
/// of the same node.
pub(crate) fn remove_catalog_dir(path: &Path) -> Result<(), CatalogError> {
    match remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == NotFound => Ok(()),
        Err(e) => Err(CatalogError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::{
        catalog::paths::CatalogLayout,
        metadata::ExtractorRegistry,
        sync::{
            consumer::HandlerRegistry,
            handlers::{SyncContext, register_default_handlers, remove_catalog_dir},
        },
    };

    #[test]
    fn test_all_tags_registered() {
        let context = SyncContext::new(
            CatalogLayout::new("/srv/books", "/srv/catalog"),
            ExtractorRegistry::new(),
        );
        let mut registry = HandlerRegistry::new();
        register_default_handlers(&mut registry, &context);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_remove_catalog_dir_idempotent() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Fiction");
        std::fs::create_dir_all(target.join("nested")).unwrap();

        remove_catalog_dir(&target).unwrap();
        assert!(!target.exists());
        // A second removal of the same node is still success.
        remove_catalog_dir(&target).unwrap();
    }
}
