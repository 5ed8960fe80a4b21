//! Generated catalog tree: layout, documents, ordering, and atomic writes.
//!
//! The catalog mirrors the source ebook tree; every node owns a directory
//! of generated documents described by [`paths`].

pub mod documents;
pub mod natural;
pub mod paths;
pub mod writer;

pub use {
    documents::FeedKind,
    natural::natural_cmp,
    paths::CatalogLayout,
    writer::write_atomic,
};
