//! Domain events for catalog synchronization.
//!
//! Every raw watcher notification is classified into exactly one of these
//! events; handlers emit further events (cascades) that re-enter the queue.

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

/// A classified change in the source or catalog tree.
///
/// Every non-`Ignored` event identifies exactly one node (a book file or a
/// folder) with a mirror directory in the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A book file finished appearing under `parent/name`.
    BookCreated { parent: PathBuf, name: String },
    /// A book file disappeared from `parent/name`.
    BookDeleted { parent: PathBuf, name: String },
    /// A directory appeared under `parent/name`.
    FolderCreated { parent: PathBuf, name: String },
    /// A directory disappeared from `parent/name`.
    FolderDeleted { parent: PathBuf, name: String },
    /// A book's entry document was (re)written in catalog directory `parent`.
    EntryDocumentChanged { parent: PathBuf },
    /// A folder's entry document was (re)written in catalog directory `parent`.
    FolderEntryDocumentChanged { parent: PathBuf },
    /// Request to regenerate the aggregate feed of catalog directory `path`.
    FolderFeedSyncRequested { path: PathBuf },
    /// Classified but requires no action.
    Ignored,
}

/// Fieldless event tag, used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BookCreated,
    BookDeleted,
    FolderCreated,
    FolderDeleted,
    EntryDocumentChanged,
    FolderEntryDocumentChanged,
    FolderFeedSyncRequested,
    Ignored,
}

impl EventKind {
    /// Stable tag name for logging and deduplication keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BookCreated => "book-created",
            EventKind::BookDeleted => "book-deleted",
            EventKind::FolderCreated => "folder-created",
            EventKind::FolderDeleted => "folder-deleted",
            EventKind::EntryDocumentChanged => "entry-changed",
            EventKind::FolderEntryDocumentChanged => "folder-entry-changed",
            EventKind::FolderFeedSyncRequested => "feed-sync",
            EventKind::Ignored => "ignored",
        }
    }
}

impl SyncEvent {
    /// Tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::BookCreated { .. } => EventKind::BookCreated,
            SyncEvent::BookDeleted { .. } => EventKind::BookDeleted,
            SyncEvent::FolderCreated { .. } => EventKind::FolderCreated,
            SyncEvent::FolderDeleted { .. } => EventKind::FolderDeleted,
            SyncEvent::EntryDocumentChanged { .. } => EventKind::EntryDocumentChanged,
            SyncEvent::FolderEntryDocumentChanged { .. } => {
                EventKind::FolderEntryDocumentChanged
            }
            SyncEvent::FolderFeedSyncRequested { .. } => EventKind::FolderFeedSyncRequested,
            SyncEvent::Ignored => EventKind::Ignored,
        }
    }

    /// The single node this event addresses, if any.
    pub fn primary_path(&self) -> Option<PathBuf> {
        match self {
            SyncEvent::BookCreated { parent, name }
            | SyncEvent::BookDeleted { parent, name }
            | SyncEvent::FolderCreated { parent, name }
            | SyncEvent::FolderDeleted { parent, name } => Some(parent.join(name)),
            SyncEvent::EntryDocumentChanged { parent }
            | SyncEvent::FolderEntryDocumentChanged { parent } => Some(parent.clone()),
            SyncEvent::FolderFeedSyncRequested { path } => Some(path.clone()),
            SyncEvent::Ignored => None,
        }
    }

    /// Key identifying the logical change for duplicate suppression.
    pub fn dedup_key(&self) -> String {
        match self {
            SyncEvent::BookCreated { parent, name }
            | SyncEvent::BookDeleted { parent, name }
            | SyncEvent::FolderCreated { parent, name }
            | SyncEvent::FolderDeleted { parent, name } => {
                format!("{}:{}:{}", self.kind().as_str(), parent.display(), name)
            }
            SyncEvent::EntryDocumentChanged { parent }
            | SyncEvent::FolderEntryDocumentChanged { parent } => {
                format!("{}:{}", self.kind().as_str(), parent.display())
            }
            SyncEvent::FolderFeedSyncRequested { path } => {
                format!("{}:{}", self.kind().as_str(), path.display())
            }
            SyncEvent::Ignored => self.kind().as_str().to_string(),
        }
    }

    /// Best-effort identity for log correlation; not used for correctness.
    pub fn trace_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.primary_path().unwrap_or_default();
        format!("{}:{}:{}", self.kind().as_str(), path.display(), millis)
    }
}
