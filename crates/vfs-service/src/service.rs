//! Request dispatch.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};
use vfs_core::FsConfig;
use vfs_proto::{
    AuthorizeFault, AuthorizeResponse, Command, CommandFault, CommandPerformedData,
    CommandResponse, DeauthorizeFault, DeauthorizeResponse, Request, ServerMessage, SessionToken,
};

use crate::host::FileSystemHost;
use crate::session::SessionManager;

/// Front door of the service: sessions plus the shared tree.
#[derive(Debug, Clone)]
pub struct VfsService {
    host: Arc<FileSystemHost>,
    sessions: SessionManager,
}

impl VfsService {
    pub fn new(host: Arc<FileSystemHost>) -> Self {
        Self {
            host,
            sessions: SessionManager::new(),
        }
    }

    pub fn from_config(config: &FsConfig) -> crate::Result<Self> {
        Ok(Self::new(Arc::new(FileSystemHost::from_config(config)?)))
    }

    pub fn host(&self) -> &Arc<FileSystemHost> {
        &self.host
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandPerformedData> {
        self.host.subscribe()
    }

    pub async fn authorize(&self, user_name: &str) -> crate::Result<AuthorizeResponse> {
        let session = self.sessions.create_session(user_name).await?;
        Ok(AuthorizeResponse {
            token: session.token,
            user_name: session.user_name.to_string(),
            current_directory: session.current_directory,
        })
    }

    pub async fn deauthorize(&self, token: SessionToken) -> crate::Result<DeauthorizeResponse> {
        let session = self.sessions.remove_session(token).await?;
        Ok(DeauthorizeResponse {
            user_name: session.user_name.to_string(),
        })
    }

    /// Parses and runs one command line for the session behind `token`.
    ///
    /// `cd` moves the session's current directory; successful mutating
    /// commands are published to subscribers.
    pub async fn perform_command(
        &self,
        token: SessionToken,
        command_line: &str,
    ) -> crate::Result<CommandResponse> {
        let session = self.sessions.get_session(token).await?;
        let command = Command::parse(command_line)?;

        let output = self
            .host
            .execute(&session.user_name, &session.current_directory, &command)
            .await?;

        let mut current_directory = session.current_directory;
        if let Command::ChangeDirectory { .. } = &command {
            self.sessions.set_current_directory(token, output.clone()).await?;
            current_directory = output.clone();
        }

        if command.is_mutating() {
            let delivered = self.host.publish(CommandPerformedData {
                command_line: command_line.to_string(),
                user_name: session.user_name.to_string(),
            });
            info!(user = %session.user_name, command = command_line, delivered, "command performed");
        }

        Ok(CommandResponse {
            command_line: command_line.to_string(),
            user_name: session.user_name.to_string(),
            current_directory,
            response_message: output,
        })
    }

    /// Runs a wire request, turning failures into fault messages.
    pub async fn handle_request(&self, request: Request) -> ServerMessage {
        match request {
            Request::Authorize(req) => match self.authorize(&req.user_name).await {
                Ok(resp) => ServerMessage::Authorized(resp),
                Err(e) => {
                    warn!(user = %req.user_name, error = %e, "authorization refused");
                    ServerMessage::AuthorizeFault(AuthorizeFault {
                        user_name: req.user_name,
                        message: e.to_string(),
                    })
                }
            },
            Request::Deauthorize(req) => match self.deauthorize(req.token).await {
                Ok(resp) => ServerMessage::Deauthorized(resp),
                Err(e) => ServerMessage::DeauthorizeFault(DeauthorizeFault {
                    message: e.to_string(),
                }),
            },
            Request::Command(req) => match self.perform_command(req.token, &req.command_line).await {
                Ok(resp) => ServerMessage::Command(resp),
                Err(e) => {
                    let user_name = self
                        .sessions
                        .get_session(req.token)
                        .await
                        .ok()
                        .map(|s| s.user_name.to_string());
                    ServerMessage::CommandFault(CommandFault {
                        command_line: req.command_line,
                        user_name,
                        message: e.to_string(),
                    })
                }
            },
        }
    }
}
