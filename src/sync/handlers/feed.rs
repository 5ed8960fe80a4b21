//! Folder feed regeneration.
//!
//! A feed is never patched in place: it is fully rebuilt from the folder's
//! immediate catalog children each time, which makes regeneration
//! idempotent and a terminal operation in the cascade chain.

use std::{
    fs::{read_dir, read_to_string},
    io::ErrorKind::NotFound,
    sync::Arc,
};

use tracing::{debug, warn};

use crate::{
    catalog::{
        documents::{self, FeedKind},
        natural::natural_cmp,
        paths::{BOOK_ENTRY_DOC, CatalogLayout, FEED_DOC, FOLDER_ENTRY_DOC, PRIVATE_PREFIX},
        writer::write_atomic,
    },
    error::domain::{CatalogError, SyncError},
    sync::{
        events::SyncEvent,
        handlers::{EventHandler, SyncContext},
    },
};

/// One child of the folder being regenerated.
struct ChildEntry {
    title: String,
    dir_name: String,
    document: String,
}

/// Rebuilds one folder's aggregate feed document from its children.
pub struct FeedSyncHandler {
    context: Arc<SyncContext>,
}

impl FeedSyncHandler {
    /// Creates the handler.
    pub fn new(context: Arc<SyncContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for FeedSyncHandler {
    fn handle(&self, event: &SyncEvent) -> Result<Vec<SyncEvent>, SyncError> {
        let SyncEvent::FolderFeedSyncRequested { path } = event else {
            return Ok(Vec::new());
        };

        let layout = &self.context.layout;
        let catalog_dir = CatalogLayout::normalize(path);
        if !catalog_dir.starts_with(layout.catalog_root()) {
            warn!("Feed sync requested outside catalog root: {:?}", catalog_dir);
            return Ok(Vec::new());
        }

        // Race with a deletion that is about to arrive as FolderDeleted:
        // do not resurrect a feed for a folder that is disappearing.
        if !layout.is_catalog_root(&catalog_dir) {
            let source_dir = layout.source_path_for(&catalog_dir)?;
            if !source_dir.is_dir() {
                debug!("Source folder gone, skipping feed for {:?}", catalog_dir);
                return Ok(Vec::new());
            }
        }

        let entries = match read_dir(&catalog_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == NotFound => {
                debug!("Catalog folder gone, skipping feed for {:?}", catalog_dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(CatalogError::io(&catalog_dir, e).into()),
        };

        let mut folders = Vec::new();
        let mut books = Vec::new();
        for entry in entries.flatten() {
            let child = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(PRIVATE_PREFIX) || !child.is_dir() {
                continue;
            }

            let folder_doc = child.join(FOLDER_ENTRY_DOC);
            let book_doc = child.join(BOOK_ENTRY_DOC);
            let (doc_path, is_folder) = if folder_doc.is_file() {
                (folder_doc, true)
            } else if book_doc.is_file() {
                (book_doc, false)
            } else {
                // Created but not yet populated; its own document write
                // will re-trigger this feed.
                debug!("Skipping child without entry document: {:?}", child);
                continue;
            };

            let document = match read_to_string(&doc_path) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Failed to read entry document {:?}: {}", doc_path, e);
                    continue;
                }
            };
            let title = documents::extract_title(&document).unwrap_or_else(|| name.clone());

            let child_entry = ChildEntry {
                title,
                dir_name: name,
                document,
            };
            if is_folder {
                folders.push(child_entry);
            } else {
                books.push(child_entry);
            }
        }

        // Folders always sort above books; each group naturally by title,
        // tie-broken on directory name for determinism.
        let by_title = |a: &ChildEntry, b: &ChildEntry| {
            natural_cmp(&a.title, &b.title).then_with(|| a.dir_name.cmp(&b.dir_name))
        };
        folders.sort_by(by_title);
        books.sort_by(by_title);

        let kind = if books.is_empty() {
            FeedKind::Navigation
        } else {
            FeedKind::Acquisition
        };
        let title = if layout.is_catalog_root(&catalog_dir) {
            "Catalog".to_string()
        } else {
            catalog_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "Catalog".to_string())
        };

        let shell = documents::feed_shell(&title, kind);
        let child_documents: Vec<String> = folders
            .into_iter()
            .chain(books)
            .map(|child| child.document)
            .collect();
        let feed = documents::splice_entries(&shell, &child_documents);
        write_atomic(&catalog_dir.join(FEED_DOC), feed.as_bytes())?;

        debug!("Feed regenerated for {:?}", catalog_dir);
        Ok(Vec::new())
    }
}
