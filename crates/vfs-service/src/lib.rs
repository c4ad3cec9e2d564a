//! Multi-user service layer for the VFS.
//!
//! This crate owns the single shared file system tree, serializes access to
//! it, tracks authorized sessions and their current directories, dispatches
//! command lines, and announces successful mutations to other sessions.

pub mod error;
pub mod host;
pub mod service;
pub mod session;

/// Result type used throughout the service layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Service error type.
pub use error::Error;

/// Shared tree owner and its locking discipline.
pub use host::FileSystemHost;

/// Request dispatch.
pub use service::VfsService;

/// Session lifecycle.
pub use session::{Session, SessionManager};
