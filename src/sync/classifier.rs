//! Raw notification classification.
//!
//! Pure, total mapping from a raw watcher notification to a domain event.
//! No I/O happens here; the watcher has already decoded everything the
//! decision needs into [`ChangeFlags`].

use std::path::Path;

use crate::{
    catalog::paths::{BOOK_ENTRY_DOC, FOLDER_ENTRY_DOC},
    metadata::is_supported_book_file,
    sync::{
        events::SyncEvent,
        watcher::{RawNotification, WatchOrigin},
    },
};

/// Classifies a raw notification into a domain event.
///
/// Catalog-origin notifications only matter when they rewrite one of the
/// generated entry documents. Source-origin notifications check deletion
/// before creation; when a rapid move leaves both signals on one
/// notification, the delete wins. A bare file create is not yet a book:
/// creation is only emitted once the write is confirmed complete, so
/// partially-written files are never processed.
pub fn classify(notification: &RawNotification) -> SyncEvent {
    match notification.origin {
        WatchOrigin::Catalog => match notification.name.as_str() {
            BOOK_ENTRY_DOC => SyncEvent::EntryDocumentChanged {
                parent: notification.parent_dir.clone(),
            },
            FOLDER_ENTRY_DOC => SyncEvent::FolderEntryDocumentChanged {
                parent: notification.parent_dir.clone(),
            },
            _ => SyncEvent::Ignored,
        },
        WatchOrigin::Books => {
            let flags = notification.flags;
            if flags.is_dir {
                if flags.is_delete() {
                    SyncEvent::FolderDeleted {
                        parent: notification.parent_dir.clone(),
                        name: notification.name.clone(),
                    }
                } else if flags.creates_dir() {
                    SyncEvent::FolderCreated {
                        parent: notification.parent_dir.clone(),
                        name: notification.name.clone(),
                    }
                } else {
                    SyncEvent::Ignored
                }
            } else {
                if !is_supported_book_file(Path::new(&notification.name)) {
                    return SyncEvent::Ignored;
                }
                if flags.is_delete() {
                    SyncEvent::BookDeleted {
                        parent: notification.parent_dir.clone(),
                        name: notification.name.clone(),
                    }
                } else if flags.creates_file() {
                    SyncEvent::BookCreated {
                        parent: notification.parent_dir.clone(),
                        name: notification.name.clone(),
                    }
                } else {
                    SyncEvent::Ignored
                }
            }
        }
    }
}
