//! Service error types.

use vfs_proto::SessionToken;

/// Error type for all service operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Fs(#[from] vfs_core::FsError),

    #[error("{0}")]
    Parse(#[from] vfs_proto::ParseError),

    #[error("user '{user_name}' is already authorized")]
    AlreadyAuthorized { user_name: String },

    #[error("unknown session {0}")]
    UnknownSession(SessionToken),
}

impl Error {
    pub fn already_authorized<S: Into<String>>(user_name: S) -> Self {
        Self::AlreadyAuthorized {
            user_name: user_name.into(),
        }
    }
}
