//! Structural validation of incoming requests

use thiserror::Error;

use crate::command::{Command, ParseError};
use crate::messages::Request;

/// Validation error
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("user name is empty")]
    EmptyUserName,
    #[error("invalid command line: {0}")]
    Command(#[from] ParseError),
    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Checks a request before it reaches the service
pub fn validate_request(request: &Request) -> Result<(), ValidationError> {
    match request {
        Request::Authorize(req) => {
            if req.user_name.trim().is_empty() {
                return Err(ValidationError::EmptyUserName);
            }
        }
        Request::Deauthorize(_) => {}
        Request::Command(req) => {
            Command::parse(&req.command_line)?;
        }
    }
    Ok(())
}

/// Parses and validates one JSON request line
pub fn decode_request(line: &str) -> Result<Request, ValidationError> {
    let request: Request = serde_json::from_str(line)?;
    validate_request(&request)?;
    Ok(request)
}
