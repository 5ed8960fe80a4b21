//! Startup bulk reconciliation.
//!
//! At startup (or on manual resync) the whole source tree is scanned into a
//! synthetic batch of events, reconciling any catalog drift accumulated
//! while the process was not running. The batch is fed directly into the
//! queue: there is no notification burst to suppress, so deduplication is
//! bypassed.

use std::path::Path;

use tracing::debug;

use crate::{
    catalog::paths::{BOOK_ENTRY_DOC, CatalogLayout, PRIVATE_PREFIX},
    error::domain::{CatalogError, SyncError},
    metadata::is_supported_book_file,
    sync::events::SyncEvent,
};

/// Plans the synthetic event batch for one full reconciliation.
///
/// Ordering matters: creations first, then stale deletions, then one feed
/// sync per live folder. FIFO processing therefore regenerates feeds only
/// after every node has been brought up to date.
///
/// # Errors
///
/// Returns `SyncError` if the source root cannot be read.
pub fn plan_bulk_sync(layout: &CatalogLayout) -> Result<Vec<SyncEvent>, SyncError> {
    let mut events = Vec::new();
    let mut feed_targets = vec![layout.catalog_root().to_path_buf()];

    collect_source_events(layout, layout.source_root(), &mut events, &mut feed_targets)?;
    collect_stale_events(layout, layout.catalog_root(), &mut events);

    events.extend(
        feed_targets
            .into_iter()
            .map(|path| SyncEvent::FolderFeedSyncRequested { path }),
    );
    Ok(events)
}

/// Walks the source tree, emitting a creation event per folder and book.
fn collect_source_events(
    layout: &CatalogLayout,
    dir: &Path,
    events: &mut Vec<SyncEvent>,
    feed_targets: &mut Vec<std::path::PathBuf>,
) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            events.push(SyncEvent::FolderCreated {
                parent: dir.to_path_buf(),
                name,
            });
            feed_targets.push(layout.catalog_dir_for(&path)?);
            collect_source_events(layout, &path, events, feed_targets)?;
        } else if is_supported_book_file(&path) {
            events.push(SyncEvent::BookCreated {
                parent: dir.to_path_buf(),
                name,
            });
        }
    }
    Ok(())
}

/// Walks the catalog tree, emitting a deletion event for every mirror
/// whose source counterpart no longer exists.
fn collect_stale_events(layout: &CatalogLayout, catalog_dir: &Path, events: &mut Vec<SyncEvent>) {
    // A catalog tree that does not exist yet simply has nothing stale.
    let Ok(entries) = std::fs::read_dir(catalog_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(PRIVATE_PREFIX) || !path.is_dir() {
            continue;
        }
        let Ok(source) = layout.source_path_for(&path) else {
            continue;
        };

        if source.is_dir() {
            collect_stale_events(layout, &path, events);
            continue;
        }
        if source.is_file() {
            // Book mirror whose source file is still present.
            continue;
        }

        debug!("Stale catalog entry found: {:?}", path);
        let parent = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| layout.source_root().to_path_buf());
        if path.join(BOOK_ENTRY_DOC).is_file() {
            events.push(SyncEvent::BookDeleted { parent, name });
        } else {
            events.push(SyncEvent::FolderDeleted { parent, name });
        }
    }
}
