//! Opdsync - OPDS Catalog Synchronizer
//!
//! Mirrors a tree of ebook files into a derived catalog tree of generated
//! OPDS documents (per-book entries, per-folder entries, per-folder
//! aggregate feeds), keeping the catalog consistent as the source tree
//! changes. The core is an event-driven engine: classified watcher
//! notifications flow through a deduplicator into a single serialized
//! consumer whose handlers mutate the catalog and cascade changes upward
//! through the folder hierarchy.

pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod sync;

// Re-export key types for convenience
pub use {
    catalog::{CatalogLayout, FeedKind},
    config::{SettingsManager, UserSettings},
    error::{CatalogError, SyncError},
    metadata::{BookMetadata, BookMetadataExtractor, ExtractorRegistry},
    sync::{CatalogSync, SyncConfig, SyncEvent},
};
