//! Raw notification definitions.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// Which watched tree a notification originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOrigin {
    /// The source ebook tree.
    Books,
    /// The generated catalog tree (document rewrites).
    Catalog,
}

/// Decoded change flags of a raw notification.
///
/// `moved_to` counts as both a directory-create and a file-create signal; a
/// bare `create` only completes a directory, because a created file may
/// still be mid-write until `close_write` arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    pub create: bool,
    pub remove: bool,
    pub close_write: bool,
    pub moved_from: bool,
    pub moved_to: bool,
    pub is_dir: bool,
}

impl ChangeFlags {
    /// The node disappeared (deleted or moved out of the tree).
    pub fn is_delete(&self) -> bool {
        self.remove || self.moved_from
    }

    /// A directory finished appearing.
    pub fn creates_dir(&self) -> bool {
        self.create || self.moved_to
    }

    /// A file finished appearing with its content fully written.
    pub fn creates_file(&self) -> bool {
        self.close_write || self.moved_to
    }
}

impl Display for ChangeFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut tokens = Vec::new();
        if self.create {
            tokens.push("CREATE");
        }
        if self.remove {
            tokens.push("DELETE");
        }
        if self.close_write {
            tokens.push("CLOSE_WRITE");
        }
        if self.moved_from {
            tokens.push("MOVED_FROM");
        }
        if self.moved_to {
            tokens.push("MOVED_TO");
        }
        if self.is_dir {
            tokens.push("ISDIR");
        }
        if tokens.is_empty() {
            return write!(f, "NONE");
        }
        write!(f, "{}", tokens.join(","))
    }
}

/// A raw filesystem-watch notification, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    /// Tree the change was observed in.
    pub origin: WatchOrigin,
    /// Directory containing the changed node.
    pub parent_dir: PathBuf,
    /// Name of the changed node inside `parent_dir`.
    pub name: String,
    /// Decoded change flags.
    pub flags: ChangeFlags,
}

#[cfg(test)]
mod tests {
    use crate::sync::watcher::events::ChangeFlags;

    #[test]
    fn test_flags_display() {
        let flags = ChangeFlags {
            create: true,
            is_dir: true,
            ..ChangeFlags::default()
        };
        assert_eq!(flags.to_string(), "CREATE,ISDIR");
        assert_eq!(ChangeFlags::default().to_string(), "NONE");
    }

    #[test]
    fn test_delete_and_create_derivation() {
        let moved_out = ChangeFlags {
            moved_from: true,
            ..ChangeFlags::default()
        };
        assert!(moved_out.is_delete());
        assert!(!moved_out.creates_file());

        // A bare create completes a directory but not a file.
        let created = ChangeFlags {
            create: true,
            ..ChangeFlags::default()
        };
        assert!(created.creates_dir());
        assert!(!created.creates_file());

        let closed = ChangeFlags {
            close_write: true,
            ..ChangeFlags::default()
        };
        assert!(closed.creates_file());
    }
}
