//! Catalog tree layout and path mapping.
//!
//! The catalog tree mirrors the source tree node for node: for every book or
//! folder at `source/R` there is a directory `catalog/R/` holding generated
//! documents. This module owns the mapping between the two trees and the
//! names of the generated documents.

use std::path::{Path, PathBuf};

use crate::error::domain::CatalogError;

/// Generated per-book entry document name.
pub const BOOK_ENTRY_DOC: &str = "entry.xml";
/// Generated per-folder entry document name.
pub const FOLDER_ENTRY_DOC: &str = "folder.xml";
/// Generated per-folder aggregate feed document name.
pub const FEED_DOC: &str = "index.xml";
/// Names starting with this prefix are catalog-private and never listed
/// as children by the feed regenerator.
pub const PRIVATE_PREFIX: &str = "_";
/// Cover image written next to a book's entry document.
pub const COVER_FILE: &str = "_cover.jpg";

/// Mapping between the source tree and the generated catalog tree.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    /// Root of the watched ebook tree.
    source_root: PathBuf,
    /// Root of the generated catalog tree.
    catalog_root: PathBuf,
}

impl CatalogLayout {
    /// Creates a layout from the two configured roots.
    ///
    /// Both roots are normalized so that later prefix checks are not
    /// confused by trailing separators.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(source_root: P, catalog_root: Q) -> Self {
        Self {
            source_root: Self::normalize(source_root.as_ref()),
            catalog_root: Self::normalize(catalog_root.as_ref()),
        }
    }

    /// Root of the watched ebook tree.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root of the generated catalog tree.
    pub fn catalog_root(&self) -> &Path {
        &self.catalog_root
    }

    /// Strips a trailing separator and collapses `.` components.
    pub fn normalize(path: &Path) -> PathBuf {
        path.components().collect()
    }

    /// Maps a source-tree path to its catalog directory.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::OutsideRoots` if the path does not live
    /// under the source root.
    pub fn catalog_dir_for(&self, source_path: &Path) -> Result<PathBuf, CatalogError> {
        let source_path = Self::normalize(source_path);
        let relative =
            source_path
                .strip_prefix(&self.source_root)
                .map_err(|_| CatalogError::OutsideRoots {
                    path: source_path.clone(),
                })?;
        Ok(self.catalog_root.join(relative))
    }

    /// Maps a catalog directory back to its source-tree counterpart.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::OutsideRoots` if the path does not live
    /// under the catalog root.
    pub fn source_path_for(&self, catalog_path: &Path) -> Result<PathBuf, CatalogError> {
        let catalog_path = Self::normalize(catalog_path);
        let relative =
            catalog_path
                .strip_prefix(&self.catalog_root)
                .map_err(|_| CatalogError::OutsideRoots {
                    path: catalog_path.clone(),
                })?;
        Ok(self.source_root.join(relative))
    }

    /// Whether a catalog directory is the catalog root itself.
    pub fn is_catalog_root(&self, path: &Path) -> bool {
        Self::normalize(path) == self.catalog_root
    }

    /// Parent of a catalog directory, clamped at the catalog root.
    ///
    /// Paths at or above the root collapse to the root, so upward cascades
    /// terminate there instead of escaping the catalog tree.
    pub fn feed_parent_of(&self, catalog_dir: &Path) -> PathBuf {
        let catalog_dir = Self::normalize(catalog_dir);
        match catalog_dir.parent() {
            Some(parent) if parent.starts_with(&self.catalog_root) => parent.to_path_buf(),
            _ => self.catalog_root.clone(),
        }
    }
}
