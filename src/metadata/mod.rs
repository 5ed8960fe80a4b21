//! Book metadata extraction.
//!
//! This module defines the metadata model for catalog entries and the
//! extractor seam that per-format parsers plug into. Extraction is best
//! effort: any failure degrades to a filename-derived title so that a
//! malformed book never blocks catalog entry creation.

use std::path::Path;

use thiserror::Error;

mod extractor;

pub use extractor::{BookMetadataExtractor, ExtractorRegistry};

/// Supported ebook file extensions for catalog monitoring.
pub const BOOK_EXTENSIONS: &[&str] = &[
    "epub", "mobi", "azw3", "pdf", "fb2", "djvu", "cbz", "cbr",
];

/// Error type for metadata extraction operations.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Failed to read the book file.
    #[error("Failed to read book file: {0}")]
    ReadError(#[from] std::io::Error),
    /// The file format is not supported by any registered extractor.
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },
    /// The file could not be parsed as its claimed format.
    #[error("Malformed book file: {reason}")]
    Malformed { reason: String },
}

/// Descriptive metadata for one book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookMetadata {
    /// Display title; never empty (falls back to the file name).
    pub title: String,
    /// Author name, when the format carries one.
    pub author: Option<String>,
    /// Free-form description or annotation.
    pub description: Option<String>,
    /// Raw cover image bytes, when the format carries one.
    pub cover: Option<Vec<u8>>,
}

/// Checks if a path corresponds to a supported ebook file.
pub fn is_supported_book_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(extension) => BOOK_EXTENSIONS
            .iter()
            .any(|&known| known.eq_ignore_ascii_case(extension)),
        None => false,
    }
}

/// Lowercase extension of a book file, if any.
pub fn book_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Derives a display title from a file name by dropping the extension.
pub fn title_from_filename(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::metadata::{is_supported_book_file, title_from_filename};

    #[test]
    fn test_supported_book_extensions() {
        let test_cases = vec![
            ("test.epub", true),
            ("test.mobi", true),
            ("test.fb2", true),
            ("test.txt", false),
            ("test", false),
            ("TEST.EPUB", true), // Case insensitive
        ];

        for (filename, expected) in test_cases {
            let path = PathBuf::from(filename);
            assert_eq!(
                is_supported_book_file(&path),
                expected,
                "Failed for filename: {}",
                filename
            );
        }
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("war.epub"), "war");
        assert_eq!(title_from_filename("war.and.peace.epub"), "war.and.peace");
        assert_eq!(title_from_filename("noext"), "noext");
        assert_eq!(title_from_filename(".hidden"), ".hidden");
    }
}
