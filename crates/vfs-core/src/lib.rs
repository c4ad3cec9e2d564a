//! VFS Core: in-memory file system tree and command console
//!
//! This crate provides the item tree (root, volumes, directories, files),
//! the case-insensitive naming rules, the path utilities, and the console
//! that resolves paths against the tree and performs commands on it.

pub mod config;
pub mod console;
pub mod error;
pub mod names;
pub mod path;
pub mod tree;
pub mod types;

// Re-export key types for convenience
pub use config::FsConfig;
pub use console::FileSystemConsole;
pub use error::{FsError, FsResult};
pub use names::{ItemNameComparer, NameComparer, UserName, UserNameComparer, UserNameSet};
pub use tree::FileSystemTree;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FsError::path_not_found("C:/missing");
        assert_eq!(err.to_string(), "path does not exist: C:/missing");
    }

    #[test]
    fn test_kind_ordering() {
        assert!(ItemKind::Root < ItemKind::Volume);
        assert!(ItemKind::Volume < ItemKind::Directory);
        assert!(ItemKind::Directory < ItemKind::File);
    }
}
