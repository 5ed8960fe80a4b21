//! Book lifecycle handlers.

use std::{
    fs::remove_file,
    io::ErrorKind::NotFound,
    os::unix::fs::symlink,
    path::Path,
    sync::Arc,
};

use tracing::{debug, warn};

use crate::{
    catalog::{
        documents,
        paths::{BOOK_ENTRY_DOC, COVER_FILE},
        writer::write_atomic,
    },
    error::domain::{CatalogError, SyncError},
    sync::{
        events::SyncEvent,
        handlers::{EventHandler, SyncContext, remove_catalog_dir},
    },
};

/// Creates a book's catalog directory, entry document, and download link.
pub struct BookCreatedHandler {
    context: Arc<SyncContext>,
}

impl BookCreatedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for BookCreatedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::BookCreated { parent, name } = event else {
            return Ok(Vec::new());
        };

        let source_file = parent.join(name);
        let catalog_dir = self.context.layout.catalog_dir_for(&source_file)?;
        std::fs::create_dir_all(&catalog_dir)
            .map_err(|e| CatalogError::io(&catalog_dir, e))?;

        // Extraction failure never blocks catalog entry creation; the
        // registry falls back to a filename-derived title.
        let metadata = self.context.extractors.extract_or_fallback(&source_file);

        let mut has_cover = false;
        if let Some(cover) = &metadata.cover {
            match write_atomic(&catalog_dir.join(COVER_FILE), cover) {
                Ok(()) => has_cover = true,
                Err(e) => warn!("Failed to write cover for {:?}: {}", source_file, e),
            }
        }

        let entry = documents::book_entry(&metadata, name, has_cover);
        write_atomic(&catalog_dir.join(BOOK_ENTRY_DOC), entry.as_bytes())?;

        // Download link used by the serving layer.
        replace_symlink(&source_file, &catalog_dir.join(name))?;

        debug!("Catalog entry written for {:?}", source_file);

        // The containing folder's feed is regenerated by the entry-changed
        // notification the write above just triggered.
        Ok(Vec::new())
    }
}

/// Removes a book's catalog directory.
pub struct BookDeletedHandler {
    context: Arc<SyncContext>,
}

impl BookDeletedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for BookDeletedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::BookDeleted { parent, name } = event else {
            return Ok(Vec::new());
        };

        let catalog_dir = self.context.layout.catalog_dir_for(&parent.join(name))?;
        remove_catalog_dir(&catalog_dir)?;
        debug!("Catalog entry removed for {:?}", catalog_dir);
        Ok(Vec::new())
    }
}

/// Replaces `link` with a symlink to `original`.
fn replace_symlink(original: &Path, link: &Path) -> Result<(), CatalogError> {
    match remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == NotFound => {}
        Err(e) => return Err(CatalogError::io(link, e)),
    }
    symlink(original, link).map_err(|e| CatalogError::io(link, e))
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{create_dir_all, read_to_string, write},
        path::PathBuf,
    };

    use tempfile::{TempDir, tempdir};

    use crate::{
        catalog::paths::{BOOK_ENTRY_DOC, CatalogLayout},
        metadata::ExtractorRegistry,
        sync::{
            events::SyncEvent,
            handlers::{BookCreatedHandler, BookDeletedHandler, EventHandler, SyncContext},
        },
    };

    fn fixture() -> (TempDir, TempDir, std::sync::Arc<SyncContext>) {
        let source = tempdir().unwrap();
        let catalog = tempdir().unwrap();
        let context = SyncContext::new(
            CatalogLayout::new(source.path(), catalog.path()),
            ExtractorRegistry::new(),
        );
        (source, catalog, context)
    }

    #[test]
    fn test_book_created_writes_entry_and_symlink() {
        let (source, catalog, context) = fixture();
        create_dir_all(source.path().join("Fiction")).unwrap();
        write(source.path().join("Fiction/war.epub"), b"epub-bytes").unwrap();

        let handler = BookCreatedHandler::new(context);
        let cascades = handler
            .handle(&SyncEvent::BookCreated {
                parent: source.path().join("Fiction"),
                name: "war.epub".to_string(),
            })
            .unwrap();
        assert!(cascades.is_empty());

        let book_dir = catalog.path().join("Fiction/war.epub");
        let entry = read_to_string(book_dir.join(BOOK_ENTRY_DOC)).unwrap();
        assert!(entry.contains("<title>war</title>"));

        let link = book_dir.join("war.epub");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            source.path().join("Fiction/war.epub")
        );
    }

    #[test]
    fn test_book_created_is_idempotent() {
        let (source, catalog, context) = fixture();
        write(source.path().join("war.epub"), b"epub-bytes").unwrap();

        let handler = BookCreatedHandler::new(context);
        let event = SyncEvent::BookCreated {
            parent: source.path().to_path_buf(),
            name: "war.epub".to_string(),
        };
        handler.handle(&event).unwrap();
        handler.handle(&event).unwrap();

        assert!(catalog.path().join("war.epub").join(BOOK_ENTRY_DOC).is_file());
    }

    #[test]
    fn test_book_deleted_twice_succeeds() {
        let (source, catalog, context) = fixture();
        create_dir_all(catalog.path().join("war.epub")).unwrap();

        let handler = BookDeletedHandler::new(context);
        let event = SyncEvent::BookDeleted {
            parent: source.path().to_path_buf(),
            name: "war.epub".to_string(),
        };
        handler.handle(&event).unwrap();
        assert!(!catalog.path().join("war.epub").exists());
        // Deleting an already-absent catalog path is success, not an error.
        handler.handle(&event).unwrap();
    }

    #[test]
    fn test_wrong_tag_is_noop() {
        let (_source, _catalog, context) = fixture();
        let handler = BookCreatedHandler::new(context);
        let cascades = handler
            .handle(&SyncEvent::FolderFeedSyncRequested {
                path: PathBuf::from("/catalog"),
            })
            .unwrap();
        assert!(cascades.is_empty());
    }
}
