//! Document-changed propagation handlers.
//!
//! When a generated entry document is rewritten, the feeds that embed it
//! must regenerate. These handlers translate document rewrites into
//! `FolderFeedSyncRequested` cascades that ripple one level upward per
//! hop, terminating at the catalog root.

use std::sync::Arc;

use crate::{
    catalog::paths::CatalogLayout,
    error::domain::SyncError,
    sync::{
        events::SyncEvent,
        handlers::{EventHandler, SyncContext},
    },
};

/// Reacts to a book entry document rewrite.
///
/// Only the book's containing folder embeds its entry document, so exactly
/// one feed regeneration is requested.
pub struct EntryChangedHandler {
    context: Arc<SyncContext>,
}

impl EntryChangedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for EntryChangedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::EntryDocumentChanged { parent } = event else {
            return Ok(Vec::new());
        };

        let book_dir = CatalogLayout::normalize(parent);
        Ok(vec![SyncEvent::FolderFeedSyncRequested {
            path: self.context.layout.feed_parent_of(&book_dir),
        }])
    }
}

/// Reacts to a folder entry document rewrite.
///
/// The folder's own feed reflects its title, and the parent's feed embeds
/// the entry document verbatim, so both must regenerate.
pub struct FolderEntryChangedHandler {
    context: Arc<SyncContext>,
}

impl FolderEntryChangedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for FolderEntryChangedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::FolderEntryDocumentChanged { parent } = event else {
            return Ok(Vec::new());
        };

        let layout = &self.context.layout;
        let folder = CatalogLayout::normalize(parent);
        let own = if folder.starts_with(layout.catalog_root()) {
            folder.clone()
        } else {
            layout.catalog_root().to_path_buf()
        };

        Ok(vec![
            SyncEvent::FolderFeedSyncRequested { path: own },
            SyncEvent::FolderFeedSyncRequested {
                path: layout.feed_parent_of(&folder),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use crate::{
        catalog::paths::CatalogLayout,
        metadata::ExtractorRegistry,
        sync::{
            events::SyncEvent,
            handlers::{
                EntryChangedHandler, EventHandler, FolderEntryChangedHandler, SyncContext,
            },
        },
    };

    fn context() -> Arc<SyncContext> {
        SyncContext::new(
            CatalogLayout::new("/books", "/data"),
            ExtractorRegistry::new(),
        )
    }

    fn feed_sync(path: &str) -> SyncEvent {
        SyncEvent::FolderFeedSyncRequested {
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_folder_entry_change_fans_out_two_feeds() {
        let handler = FolderEntryChangedHandler::new(context());
        let cascades = handler
            .handle(&SyncEvent::FolderEntryDocumentChanged {
                parent: PathBuf::from("/data/Fiction/Author"),
            })
            .unwrap();
        assert_eq!(
            cascades,
            vec![feed_sync("/data/Fiction/Author"), feed_sync("/data/Fiction")]
        );
    }

    #[test]
    fn test_folder_entry_change_clamps_at_root() {
        let handler = FolderEntryChangedHandler::new(context());
        let cascades = handler
            .handle(&SyncEvent::FolderEntryDocumentChanged {
                parent: PathBuf::from("/data/Fiction"),
            })
            .unwrap();
        // The parent of a direct child of the root is the root exactly.
        assert_eq!(cascades, vec![feed_sync("/data/Fiction"), feed_sync("/data")]);
    }

    #[test]
    fn test_folder_entry_change_normalizes_trailing_separator() {
        let handler = FolderEntryChangedHandler::new(context());
        let cascades = handler
            .handle(&SyncEvent::FolderEntryDocumentChanged {
                parent: PathBuf::from("/data/Fiction/Author/"),
            })
            .unwrap();
        assert_eq!(
            cascades,
            vec![feed_sync("/data/Fiction/Author"), feed_sync("/data/Fiction")]
        );
    }

    #[test]
    fn test_entry_change_targets_containing_folder() {
        let handler = EntryChangedHandler::new(context());
        let cascades = handler
            .handle(&SyncEvent::EntryDocumentChanged {
                parent: PathBuf::from("/data/Fiction/war.epub"),
            })
            .unwrap();
        assert_eq!(cascades, vec![feed_sync("/data/Fiction")]);

        // A book directly under the root targets the root feed.
        let cascades = handler
            .handle(&SyncEvent::EntryDocumentChanged {
                parent: PathBuf::from("/data/war.epub"),
            })
            .unwrap();
        assert_eq!(cascades, vec![feed_sync("/data")]);
    }
}
