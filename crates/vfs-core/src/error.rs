//! Error types for VFS Core

use crate::ItemKind;

/// Core file system error type
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("path does not exist: {path}")]
    PathNotFound { path: String },

    #[error("'{path}' is a {found}, expected {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: ItemKind,
    },

    #[error("an item named '{name}' already exists")]
    NameConflict { name: String },

    #[error("directory '{path}' is not empty")]
    NotEmpty { path: String },

    #[error("locked: {message}")]
    LockedResource { message: String },

    #[error("invalid relocation: {message}")]
    InvalidRelocation { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl FsError {
    pub fn path_not_found<S: Into<String>>(path: S) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn wrong_kind<S: Into<String>>(path: S, expected: &'static str, found: ItemKind) -> Self {
        Self::WrongKind {
            path: path.into(),
            expected,
            found,
        }
    }

    pub fn name_conflict<S: Into<String>>(name: S) -> Self {
        Self::NameConflict { name: name.into() }
    }

    pub fn not_empty<S: Into<String>>(path: S) -> Self {
        Self::NotEmpty { path: path.into() }
    }

    pub fn locked<S: Into<String>>(message: S) -> Self {
        Self::LockedResource {
            message: message.into(),
        }
    }

    pub fn invalid_relocation<S: Into<String>>(message: S) -> Self {
        Self::InvalidRelocation {
            message: message.into(),
        }
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
