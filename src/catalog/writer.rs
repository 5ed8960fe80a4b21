//! Atomic document writes.
//!
//! Documents are written to a temporary file in the destination directory
//! and renamed into place, so readers never observe partial content.

use std::{io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::error::domain::CatalogError;

/// Atomically writes `contents` to `dest`.
///
/// The temporary file is created in the destination's parent directory so
/// the final rename never crosses a filesystem boundary.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the temporary file cannot be created,
/// written, or renamed into place.
pub fn write_atomic(dest: &Path, contents: &[u8]) -> Result<(), CatalogError> {
    let dir = dest.parent().ok_or_else(|| CatalogError::OutsideRoots {
        path: dest.to_path_buf(),
    })?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CatalogError::io(dir, e))?;
    temp.write_all(contents)
        .map_err(|e| CatalogError::io(dest, e))?;
    temp.persist(dest)
        .map_err(|e| CatalogError::io(dest, e.error))?;

    Ok(())
}
