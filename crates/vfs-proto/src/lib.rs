//! VFS Protocol: command grammar and wire messages
//!
//! This crate defines the command-line language accepted by the console
//! service and the JSON request/response types exchanged with clients.

pub mod command;
pub mod messages;
pub mod validation;

// Re-export key types
pub use command::{Command, ParseError};
pub use messages::{
    AuthorizeFault, AuthorizeRequest, AuthorizeResponse, CommandFault, CommandPerformedData,
    CommandRequest, CommandResponse, DeauthorizeFault, DeauthorizeRequest, DeauthorizeResponse,
    Request, ServerMessage, SessionToken,
};
pub use validation::*;
