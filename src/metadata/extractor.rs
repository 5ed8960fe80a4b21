//! Extractor registry with filename fallback.

use std::{collections::HashMap, path::Path, sync::Arc};

use tracing::{debug, warn};

use crate::metadata::{BookMetadata, MetadataError, book_extension, title_from_filename};

/// Per-format metadata extractor.
///
/// Implementations parse one or more book formats and must signal failure
/// through the `Result` instead of panicking; the registry downgrades any
/// failure to a filename-derived title.
pub trait BookMetadataExtractor: Send + Sync {
    /// Lowercase extensions this extractor handles.
    fn extensions(&self) -> &[&'static str];

    /// Extracts metadata from the book at `path`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if the file cannot be read or parsed.
    fn extract(&self, path: &Path) -> Result<BookMetadata, MetadataError>;
}

/// Extension-keyed registry of metadata extractors.
#[derive(Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn BookMetadataExtractor>>,
}

impl ExtractorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extractor for every extension it declares.
    ///
    /// A later registration for the same extension replaces the earlier one.
    pub fn register(&mut self, extractor: Arc<dyn BookMetadataExtractor>) {
        for extension in extractor.extensions() {
            self.by_extension
                .insert((*extension).to_lowercase(), extractor.clone());
        }
    }

    /// Extracts metadata for `path`, falling back to a filename-derived
    /// title on any failure.
    ///
    /// Extraction failure is logged and never propagated; the catalog entry
    /// is created either way.
    pub fn extract_or_fallback(&self, path: &Path) -> BookMetadata {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(extension) = book_extension(path) {
            match self.by_extension.get(&extension) {
                Some(extractor) => match extractor.extract(path) {
                    Ok(mut metadata) => {
                        if metadata.title.is_empty() {
                            metadata.title = title_from_filename(&file_name);
                        }
                        return metadata;
                    }
                    Err(e) => {
                        warn!("Metadata extraction failed for {:?}: {}", path, e);
                    }
                },
                None => {
                    debug!("No extractor registered for .{}, using filename", extension);
                }
            }
        }

        BookMetadata {
            title: title_from_filename(&file_name),
            ..BookMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use crate::metadata::{
        BookMetadata, BookMetadataExtractor, ExtractorRegistry, MetadataError,
    };

    struct StubExtractor {
        fail: bool,
    }

    impl BookMetadataExtractor for StubExtractor {
        fn extensions(&self) -> &[&'static str] {
            &["epub"]
        }

        fn extract(&self, _path: &Path) -> Result<BookMetadata, MetadataError> {
            if self.fail {
                return Err(MetadataError::Malformed {
                    reason: "broken container".to_string(),
                });
            }
            Ok(BookMetadata {
                title: "Extracted Title".to_string(),
                author: Some("Extracted Author".to_string()),
                description: None,
                cover: None,
            })
        }
    }

    #[test]
    fn test_fallback_without_extractor() {
        let registry = ExtractorRegistry::new();
        let metadata = registry.extract_or_fallback(Path::new("/books/War and Peace.epub"));
        assert_eq!(metadata.title, "War and Peace");
        assert_eq!(metadata.author, None);
    }

    #[test]
    fn test_registered_extractor_used() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(StubExtractor { fail: false }));

        let metadata = registry.extract_or_fallback(Path::new("/books/war.epub"));
        assert_eq!(metadata.title, "Extracted Title");
        assert_eq!(metadata.author, Some("Extracted Author".to_string()));
    }

    #[test]
    fn test_failing_extractor_degrades_to_filename() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(StubExtractor { fail: true }));

        let metadata = registry.extract_or_fallback(Path::new("/books/war.epub"));
        assert_eq!(metadata.title, "war");
        assert_eq!(metadata.author, None);
    }
}
