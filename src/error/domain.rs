//! Domain-specific error types using `thiserror`.
//!
//! This module defines the main error enums for the two domains of the
//! synchronizer: catalog-tree manipulation and the event engine itself.

use std::{io::Error as IoError, path::PathBuf, result::Result as StdResult};

use {anyhow::Error, thiserror::Error};

use crate::metadata::MetadataError;

/// Catalog-tree errors.
///
/// Raised by the path mapping layer, the atomic writer, and the handlers
/// while they mutate the generated catalog tree.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read or write a catalog path.
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    /// A path could not be mapped between the source and catalog trees.
    #[error("Path outside configured roots: {path:?}")]
    OutsideRoots { path: PathBuf },
}

impl CatalogError {
    /// Wraps an IO error together with the path it occurred at.
    pub fn io<P: Into<PathBuf>>(path: P, source: IoError) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Synchronization-engine errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Catalog mutation failed inside a handler.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Metadata extraction failed where no fallback applies.
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    /// Failed to initialize or drive the filesystem watcher.
    #[error("Watch error: {reason}")]
    Watch { reason: String },
    /// Invalid event payload or engine state.
    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },
}

/// Operational error context propagation with `anyhow`.
///
/// Used for startup paths that need rich context but no specific
/// handling logic.
pub type Result<T> = StdResult<T, Error>;

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind::PermissionDenied};

    use crate::error::domain::{CatalogError, SyncError};

    #[test]
    fn test_catalog_error_display() {
        let io_error = CatalogError::io("/data/Fiction", Error::new(PermissionDenied, "denied"));
        assert!(io_error.to_string().contains("/data/Fiction"));
        assert!(io_error.to_string().contains("denied"));

        let mapping_error = CatalogError::OutsideRoots {
            path: "/elsewhere".into(),
        };
        assert!(mapping_error.to_string().contains("/elsewhere"));
    }

    #[test]
    fn test_sync_error_display() {
        let watch_error = SyncError::Watch {
            reason: "inotify limit reached".to_string(),
        };
        assert_eq!(
            watch_error.to_string(),
            "Watch error: inotify limit reached"
        );

        let invalid_data_error = SyncError::InvalidData {
            reason: "test reason".to_string(),
        };
        assert_eq!(invalid_data_error.to_string(), "Invalid data: test reason");
    }

    #[test]
    fn test_sync_error_from_catalog_error() {
        let inner = CatalogError::OutsideRoots {
            path: "/tmp/x".into(),
        };
        let outer: SyncError = inner.into();
        assert!(outer.to_string().starts_with("Catalog error:"));
    }
}
