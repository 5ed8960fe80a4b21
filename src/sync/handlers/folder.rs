//! Folder lifecycle handlers.

use std::{fs::read_dir, path::Path, sync::Arc};

use tracing::debug;

use crate::{
    catalog::{
        documents,
        paths::FOLDER_ENTRY_DOC,
        writer::write_atomic,
    },
    error::domain::{CatalogError, SyncError},
    metadata::is_supported_book_file,
    sync::{
        events::SyncEvent,
        handlers::{EventHandler, SyncContext, remove_catalog_dir},
    },
};

/// Creates a folder's catalog directory and entry document.
pub struct FolderCreatedHandler {
    context: Arc<SyncContext>,
}

impl FolderCreatedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for FolderCreatedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::FolderCreated { parent, name } = event else {
            return Ok(Vec::new());
        };

        let source_dir = parent.join(name);
        let catalog_dir = self.context.layout.catalog_dir_for(&source_dir)?;
        std::fs::create_dir_all(&catalog_dir)
            .map_err(|e| CatalogError::io(&catalog_dir, e))?;

        // The root has no parent to list it, so it never gets an entry
        // document, only a feed.
        if !self.context.layout.is_catalog_root(&catalog_dir) {
            let (subfolders, books) = count_source_children(&source_dir);
            let entry = documents::folder_entry(name, subfolders, books);
            write_atomic(&catalog_dir.join(FOLDER_ENTRY_DOC), entry.as_bytes())?;
        }

        debug!("Catalog folder prepared for {:?}", source_dir);
        Ok(Vec::new())
    }
}

/// Removes a folder's catalog directory.
pub struct FolderDeletedHandler {
    context: Arc<SyncContext>,
}

impl FolderDeletedHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for FolderDeletedHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::FolderDeleted { parent, name } = event else {
            return Ok(Vec::new());
        };

        let catalog_dir = self.context.layout.catalog_dir_for(&parent.join(name))?;
        remove_catalog_dir(&catalog_dir)?;
        debug!("Catalog folder removed for {:?}", catalog_dir);
        Ok(Vec::new())
    }
}

/// Counts immediate subfolders and book files of a source folder.
///
/// A folder that does not exist yet (creation raced its population) counts
/// as empty rather than failing.
fn count_source_children(dir: &Path) -> (usize, usize) {
    let Ok(entries) = read_dir(dir) else {
        return (0, 0);
    };

    let mut subfolders = 0;
    let mut books = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subfolders += 1;
        } else if is_supported_book_file(&path) {
            books += 1;
        }
    }
    (subfolders, books)
}
