//! OPDS document assembly.
//!
//! Entry and feed documents are plain Atom XML assembled as strings. Feed
//! shells end with a well-known closing tag that the feed regenerator uses
//! as a splice point for embedding child entry documents verbatim, so entry
//! documents carry no XML declaration of their own.

use std::sync::OnceLock;

use {
    chrono::{SecondsFormat, Utc},
    regex::Regex,
};

use crate::metadata::BookMetadata;

/// Splice sentinel: child entries are inserted immediately before this tag.
pub const FEED_CLOSING_TAG: &str = "</feed>";

/// Feed flavor embedded in the feed's self link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// Folder listing without any book entries.
    Navigation,
    /// Folder listing containing at least one book entry.
    Acquisition,
}

impl FeedKind {
    /// OPDS kind token as it appears in the self-link type attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Navigation => "navigation",
            FeedKind::Acquisition => "acquisition",
        }
    }
}

/// Escapes text for inclusion in XML element content or attributes.
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builds a book entry document.
///
/// The acquisition link points at the symlink named after the book file
/// inside the book's catalog directory.
///
/// # Arguments
///
/// * `metadata` - Extracted (or fallback) book metadata.
/// * `file_name` - The book's file name in the source tree.
/// * `has_cover` - Whether a cover image was written next to the entry.
pub fn book_entry(metadata: &BookMetadata, file_name: &str, has_cover: bool) -> String {
    let mut entry = String::new();
    entry.push_str("<entry>\n");
    entry.push_str(&format!(
        "  <title>{}</title>\n",
        xml_escape(&metadata.title)
    ));
    entry.push_str(&format!(
        "  <id>urn:opdsync:{}</id>\n",
        xml_escape(file_name)
    ));
    entry.push_str(&format!("  <updated>{}</updated>\n", timestamp()));
    if let Some(author) = &metadata.author {
        entry.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            xml_escape(author)
        ));
    }
    if let Some(description) = &metadata.description {
        entry.push_str(&format!(
            "  <summary>{}</summary>\n",
            xml_escape(description)
        ));
    }
    entry.push_str(&format!(
        "  <link rel=\"http://opds-spec.org/acquisition\" href=\"{}\" type=\"{}\"/>\n",
        xml_escape(file_name),
        media_type_for(file_name)
    ));
    if has_cover {
        entry.push_str(
            "  <link rel=\"http://opds-spec.org/image\" href=\"_cover.jpg\" type=\"image/jpeg\"/>\n",
        );
    }
    entry.push_str("</entry>\n");
    entry
}

/// Builds a folder entry document summarizing the folder's children.
///
/// # Arguments
///
/// * `name` - Folder name, used as title and link target.
/// * `subfolders` - Number of immediate subfolders in the source folder.
/// * `books` - Number of immediate book files in the source folder.
pub fn folder_entry(name: &str, subfolders: usize, books: usize) -> String {
    let mut entry = String::new();
    entry.push_str("<entry>\n");
    entry.push_str(&format!("  <title>{}</title>\n", xml_escape(name)));
    entry.push_str(&format!("  <id>urn:opdsync:{}</id>\n", xml_escape(name)));
    entry.push_str(&format!("  <updated>{}</updated>\n", timestamp()));
    entry.push_str(&format!(
        "  <content type=\"text\">{} folders, {} books</content>\n",
        subfolders, books
    ));
    entry.push_str(&format!(
        "  <link rel=\"subsection\" href=\"{}\" \
         type=\"application/atom+xml;profile=opds-catalog\"/>\n",
        xml_escape(name)
    ));
    entry.push_str("</entry>\n");
    entry
}

/// Builds an empty feed document ending with [`FEED_CLOSING_TAG`].
pub fn feed_shell(title: &str, kind: FeedKind) -> String {
    let mut feed = String::new();
    feed.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\" \
                   xmlns:opds=\"http://opds-spec.org/2010/catalog\">\n");
    feed.push_str(&format!("  <title>{}</title>\n", xml_escape(title)));
    feed.push_str(&format!("  <updated>{}</updated>\n", timestamp()));
    feed.push_str(&format!(
        "  <link rel=\"self\" href=\"index.xml\" \
         type=\"application/atom+xml;profile=opds-catalog;kind={}\"/>\n",
        kind.as_str()
    ));
    feed.push_str(FEED_CLOSING_TAG);
    feed.push('\n');
    feed
}

/// Splices entry documents into a feed shell before the closing tag.
///
/// The shell is expected to contain [`FEED_CLOSING_TAG`]; a shell without
/// it is returned unchanged.
pub fn splice_entries(shell: &str, entries: &[String]) -> String {
    let Some(at) = shell.rfind(FEED_CLOSING_TAG) else {
        debug_assert!(false, "feed shell missing closing tag");
        return shell.to_string();
    };

    let mut feed = String::with_capacity(
        shell.len() + entries.iter().map(String::len).sum::<usize>(),
    );
    feed.push_str(&shell[..at]);
    for entry in entries {
        feed.push_str(entry);
    }
    feed.push_str(&shell[at..]);
    feed
}

/// Extracts the display title from a generated document.
///
/// Returns `None` when the document carries no title element, letting the
/// caller fall back to the directory name.
pub fn extract_title(document: &str) -> Option<String> {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE_RE.get_or_init(|| Regex::new(r"<title[^>]*>([^<]*)</title>").unwrap());

    re.captures(document)
        .map(|captures| xml_unescape(captures[1].trim()))
        .filter(|title| !title.is_empty())
}

fn media_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "epub" => "application/epub+zip",
        "mobi" | "azw3" => "application/x-mobipocket-ebook",
        "pdf" => "application/pdf",
        "fb2" => "application/fb2+xml",
        "djvu" => "image/vnd.djvu",
        "cbz" => "application/vnd.comicbook+zip",
        "cbr" => "application/vnd.comicbook-rar",
        _ => "application/octet-stream",
    }
}
