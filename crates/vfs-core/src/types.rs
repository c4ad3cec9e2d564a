//! Core type definitions for VFS

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle of an item stored in a [`crate::FileSystemTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

/// Kind of a file system item.
///
/// The declaration order is the display order used when printing the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Root,
    Volume,
    Directory,
    File,
}

impl ItemKind {
    /// Whether items of this kind may hold directories and files.
    pub fn is_container(&self) -> bool {
        matches!(self, ItemKind::Volume | ItemKind::Directory)
    }

    /// Whether items of this kind may be created, removed, copied or moved by commands.
    pub fn is_movable(&self) -> bool {
        matches!(self, ItemKind::Directory | ItemKind::File)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemKind::Root => "root",
            ItemKind::Volume => "volume",
            ItemKind::Directory => "directory",
            ItemKind::File => "file",
        };
        f.write_str(s)
    }
}
