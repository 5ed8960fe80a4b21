//! File system change detection using the `notify` crate.
//!
//! This module watches the source ebook tree and the generated catalog tree
//! with one recursive watcher, translating `notify` events into
//! [`RawNotification`] values for the classification stage. The engine
//! never sees `notify` types directly.

use std::path::Path;

use {
    async_channel::Sender,
    notify::{
        Config, Error, Event, RecommendedWatcher,
        RecursiveMode::Recursive,
        Watcher,
        event::{
            AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode,
        },
    },
    tracing::{debug, error, warn},
};

use crate::{
    catalog::paths::{CatalogLayout, FOLDER_ENTRY_DOC},
    error::domain::SyncError,
};

mod config;
mod events;

pub use {
    config::WatcherConfig,
    events::{ChangeFlags, RawNotification, WatchOrigin},
};

/// File system watcher for the source and catalog trees.
pub struct CatalogWatcher {
    /// Internal notify watcher.
    _watcher: RecommendedWatcher,
    /// Tree layout, used to attribute paths to an origin.
    layout: CatalogLayout,
}

impl CatalogWatcher {
    /// Creates a new watcher delivering notifications into `event_sender`.
    ///
    /// # Arguments
    ///
    /// * `layout` - Source/catalog tree layout.
    /// * `event_sender` - Channel sender for raw notifications.
    /// * `config` - Optional configuration (uses defaults if None).
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Watch` if the watcher cannot be initialized.
    pub fn new(
        layout: CatalogLayout,
        event_sender: Sender<RawNotification>,
        config: Option<WatcherConfig>,
    ) -> Result<Self, SyncError> {
        let config = config.unwrap_or_default();

        let callback_layout = layout.clone();
        let watcher = RecommendedWatcher::new(
            move |res: Result<Event, Error>| {
                Self::handle_raw_event(res, &event_sender, &callback_layout, &config);
            },
            Config::default(),
        )
        .map_err(|e| SyncError::Watch {
            reason: format!("Failed to create file watcher: {}", e),
        })?;

        Ok(Self {
            _watcher: watcher,
            layout,
        })
    }

    /// Starts watching both roots recursively.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Watch` if either root cannot be watched.
    pub fn watch_roots(&mut self) -> Result<(), SyncError> {
        let roots = [
            self.layout.source_root().to_path_buf(),
            self.layout.catalog_root().to_path_buf(),
        ];
        for root in roots {
            self._watcher
                .watch(&root, Recursive)
                .map_err(|e| SyncError::Watch {
                    reason: format!("Failed to watch directory {:?}: {}", root, e),
                })?;
            debug!("Started watching directory: {:?}", root);
        }
        Ok(())
    }

    /// Handles raw events from the notify crate.
    fn handle_raw_event(
        res: Result<Event, Error>,
        sender: &Sender<RawNotification>,
        layout: &CatalogLayout,
        config: &WatcherConfig,
    ) {
        match res {
            Ok(event) => {
                debug!("Raw file system event: {:?}", event);
                for (index, path) in event.paths.iter().enumerate() {
                    let Some(notification) =
                        Self::notification_for(&event.kind, path, index, layout, config)
                    else {
                        continue;
                    };
                    if sender.try_send(notification).is_err() {
                        warn!("Notification channel full; dropping event for {:?}", path);
                    }
                }
            }
            Err(e) => {
                error!("File system watcher error: {}", e);
            }
        }
    }

    /// Translates one path of a notify event into a raw notification.
    fn notification_for(
        kind: &EventKind,
        path: &Path,
        index: usize,
        layout: &CatalogLayout,
        config: &WatcherConfig,
    ) -> Option<RawNotification> {
        let parent_dir = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_string_lossy().to_string();

        if !config.include_hidden && name.starts_with('.') {
            return None;
        }

        // Attribute to an origin; the catalog root is checked first in case
        // it is nested under the source root.
        let origin = if path.starts_with(layout.catalog_root()) {
            WatchOrigin::Catalog
        } else if path.starts_with(layout.source_root()) {
            WatchOrigin::Books
        } else {
            return None;
        };

        let flags = Self::flags_for(kind, path, index, layout)?;

        Some(RawNotification {
            origin,
            parent_dir,
            name,
            flags,
        })
    }

    /// Decodes a notify event kind into change flags.
    ///
    /// Returns `None` for event kinds the synchronizer never acts on
    /// (metadata changes, in-progress writes, reads).
    fn flags_for(
        kind: &EventKind,
        path: &Path,
        index: usize,
        layout: &CatalogLayout,
    ) -> Option<ChangeFlags> {
        let mut flags = ChangeFlags::default();
        match kind {
            EventKind::Create(create_kind) => {
                flags.create = true;
                flags.is_dir = matches!(create_kind, CreateKind::Folder) || path.is_dir();
            }
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
                flags.close_write = true;
            }
            EventKind::Remove(remove_kind) => {
                flags.remove = true;
                flags.is_dir = match remove_kind {
                    RemoveKind::Folder => true,
                    RemoveKind::File => false,
                    _ => Self::was_directory(path, layout),
                };
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                flags.moved_from = true;
                flags.is_dir = Self::was_directory(path, layout);
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                flags.moved_to = true;
                flags.is_dir = path.is_dir();
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                // Both-paths rename: first path is the old name, second the new.
                if index == 0 {
                    flags.moved_from = true;
                    flags.is_dir = Self::was_directory(path, layout);
                } else {
                    flags.moved_to = true;
                    flags.is_dir = path.is_dir();
                }
            }
            _ => {
                debug!("Ignoring event kind {:?} for path: {:?}", kind, path);
                return None;
            }
        }
        Some(flags)
    }

    /// Whether a now-gone source path used to be a directory.
    ///
    /// The source node is already gone, but its catalog mirror still
    /// records what it was: folder mirrors carry a folder entry document.
    fn was_directory(path: &Path, layout: &CatalogLayout) -> bool {
        match layout.catalog_dir_for(path) {
            Ok(dir) => dir.join(FOLDER_ENTRY_DOC).is_file(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::create_dir_all, path::Path};

    use {
        notify::event::{CreateKind, EventKind},
        tempfile::tempdir,
    };

    use crate::{
        catalog::paths::{CatalogLayout, FOLDER_ENTRY_DOC},
        sync::watcher::{CatalogWatcher, WatchOrigin, WatcherConfig},
    };

    #[test]
    fn test_notification_origin_and_shape() {
        let layout = CatalogLayout::new("/srv/books", "/srv/catalog");
        let config = WatcherConfig::default();

        let notification = CatalogWatcher::notification_for(
            &EventKind::Create(CreateKind::Folder),
            Path::new("/srv/books/Fiction"),
            0,
            &layout,
            &config,
        )
        .unwrap();

        assert_eq!(notification.origin, WatchOrigin::Books);
        assert_eq!(notification.parent_dir, Path::new("/srv/books"));
        assert_eq!(notification.name, "Fiction");
        assert!(notification.flags.create && notification.flags.is_dir);

        let catalog_side = CatalogWatcher::notification_for(
            &EventKind::Create(CreateKind::File),
            Path::new("/srv/catalog/Fiction/entry.xml"),
            0,
            &layout,
            &config,
        )
        .unwrap();
        assert_eq!(catalog_side.origin, WatchOrigin::Catalog);

        // Paths outside both roots are dropped.
        assert!(
            CatalogWatcher::notification_for(
                &EventKind::Create(CreateKind::File),
                Path::new("/elsewhere/file.epub"),
                0,
                &layout,
                &config,
            )
            .is_none()
        );
    }

    #[test]
    fn test_hidden_names_filtered() {
        let layout = CatalogLayout::new("/srv/books", "/srv/catalog");
        let config = WatcherConfig::default();

        assert!(
            CatalogWatcher::notification_for(
                &EventKind::Create(CreateKind::File),
                Path::new("/srv/books/.hidden.epub"),
                0,
                &layout,
                &config,
            )
            .is_none()
        );
    }

    #[test]
    fn test_removed_directory_recognized_via_catalog_mirror() {
        let source = tempdir().unwrap();
        let catalog = tempdir().unwrap();
        let layout = CatalogLayout::new(source.path(), catalog.path());

        let mirror = catalog.path().join("Fiction");
        create_dir_all(&mirror).unwrap();
        std::fs::write(mirror.join(FOLDER_ENTRY_DOC), "<entry/>").unwrap();

        assert!(CatalogWatcher::was_directory(
            &source.path().join("Fiction"),
            &layout
        ));
        assert!(!CatalogWatcher::was_directory(
            &source.path().join("gone.epub"),
            &layout
        ));
    }
}
