use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::{wrappers::UnixListenerStream, StreamExt};
use tracing::{debug, error, info, warn};
use vfs_core::{NameComparer, UserNameComparer};
use vfs_proto::{
    decode_request, AuthorizeFault, CommandFault, Request, ServerMessage, SessionToken,
};
use vfs_service::VfsService;

pub struct DaemonServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    service: VfsService,
}

impl DaemonServer {
    pub fn new(socket_path: PathBuf, service: VfsService) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // A stale socket from a previous run blocks bind.
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        info!("Daemon listening on socket: {}", socket_path.display());

        Ok(Self {
            socket_path,
            listener: Some(listener),
            service,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn run(&mut self) -> Result<()> {
        let listener = self.listener.take().ok_or_else(|| anyhow!("Server not initialized"))?;
        let mut stream = UnixListenerStream::new(listener);

        info!("VFS daemon started. Press Ctrl+C to stop.");

        while let Some(stream) = stream.next().await {
            match stream {
                Ok(socket) => {
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(socket, service).await {
                            error!("Error handling client: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                }
            }
        }

        Ok(())
    }

    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down daemon...");

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        Ok(())
    }
}

/// What a connection knows about the session it opened.
#[derive(Default)]
struct Connection {
    token: Option<SessionToken>,
    user_name: Option<String>,
}

impl Connection {
    fn should_forward(&self, from_user: &str) -> bool {
        self.user_name
            .as_deref()
            .is_some_and(|own| !UserNameComparer.equals(own, from_user))
    }

    fn observe(&mut self, reply: &ServerMessage) {
        match reply {
            ServerMessage::Authorized(resp) => {
                self.token = Some(resp.token);
                self.user_name = Some(resp.user_name.clone());
            }
            ServerMessage::Deauthorized(resp) => {
                if self
                    .user_name
                    .as_deref()
                    .is_some_and(|own| UserNameComparer.equals(own, &resp.user_name))
                {
                    self.token = None;
                    self.user_name = None;
                }
            }
            _ => {}
        }
    }
}

async fn handle_client(socket: UnixStream, service: VfsService) -> Result<()> {
    debug!("Handling new client connection");

    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut events = service.subscribe();
    let mut connection = Connection::default();

    let outcome: Result<()> = async {
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let reply = process_line(&service, &connection, &line).await;
                    connection.observe(&reply);
                    write_message(&mut writer, &reply).await?;
                }
                event = events.recv() => match event {
                    Ok(data) => {
                        if connection.should_forward(&data.user_name) {
                            write_message(&mut writer, &ServerMessage::CommandPerformed(data)).await?;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "client fell behind on notifications");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        Ok(())
    }
    .await;

    if let Some(token) = connection.token {
        if let Err(e) = service.deauthorize(token).await {
            debug!("session already gone on disconnect: {}", e);
        }
    }
    debug!("Client disconnected");

    outcome
}

async fn process_line(service: &VfsService, connection: &Connection, line: &str) -> ServerMessage {
    match decode_request(line) {
        Ok(Request::Authorize(req)) if connection.token.is_some() => {
            ServerMessage::AuthorizeFault(AuthorizeFault {
                user_name: req.user_name,
                message: "connection already has a session".to_string(),
            })
        }
        Ok(request) => service.handle_request(request).await,
        Err(e) => {
            warn!("rejected request: {}", e);
            ServerMessage::CommandFault(CommandFault {
                command_line: line.to_string(),
                user_name: connection.user_name.clone(),
                message: e.to_string(),
            })
        }
    }
}

async fn write_message<W>(writer: &mut W, message: &ServerMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(message)?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}
