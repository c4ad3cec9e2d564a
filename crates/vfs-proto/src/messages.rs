//! Wire message types for the VFS service
//!
//! Messages are JSON objects, one per line, tagged by `op`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session token handed out on authorization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Authorization request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub user_name: String,
}

/// Authorization response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub token: SessionToken,
    pub user_name: String,
    pub current_directory: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeFault {
    pub user_name: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeauthorizeRequest {
    pub token: SessionToken,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeauthorizeResponse {
    pub user_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeauthorizeFault {
    pub message: String,
}

/// A command line issued by an authorized session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub token: SessionToken,
    pub command_line: String,
}

/// Result of a successful command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_line: String,
    pub user_name: String,
    /// Session's current directory after the command
    pub current_directory: String,
    /// Resolved path, printed tree, or empty for copy/move
    pub response_message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFault {
    pub command_line: String,
    pub user_name: Option<String>,
    pub message: String,
}

/// Announcement of a successful mutating command, sent to other sessions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPerformedData {
    pub command_line: String,
    pub user_name: String,
}

/// Client to server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Authorize(AuthorizeRequest),
    Deauthorize(DeauthorizeRequest),
    Command(CommandRequest),
}

/// Server to client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerMessage {
    Authorized(AuthorizeResponse),
    AuthorizeFault(AuthorizeFault),
    Deauthorized(DeauthorizeResponse),
    DeauthorizeFault(DeauthorizeFault),
    Command(CommandResponse),
    CommandFault(CommandFault),
    CommandPerformed(CommandPerformedData),
}

impl Request {
    pub fn authorize<S: Into<String>>(user_name: S) -> Self {
        Request::Authorize(AuthorizeRequest {
            user_name: user_name.into(),
        })
    }

    pub fn deauthorize(token: SessionToken) -> Self {
        Request::Deauthorize(DeauthorizeRequest { token })
    }

    pub fn command<S: Into<String>>(token: SessionToken, command_line: S) -> Self {
        Request::Command(CommandRequest {
            token,
            command_line: command_line.into(),
        })
    }
}
