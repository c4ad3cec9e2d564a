//! The process-wide owner of the file system tree.
//!
//! Mutating commands take the write half of the lock for their whole
//! resolve-check-mutate sequence; `cd` and `print` share the read half.

use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use vfs_core::{FileSystemConsole, FsConfig, FsResult, UserName};
use vfs_proto::{Command, CommandPerformedData};

/// Owns the console and the notification channel.
#[derive(Debug)]
pub struct FileSystemHost {
    console: RwLock<FileSystemConsole>,
    events: broadcast::Sender<CommandPerformedData>,
}

impl FileSystemHost {
    pub fn new(console: FileSystemConsole, notification_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(notification_capacity.max(1));
        Self {
            console: RwLock::new(console),
            events,
        }
    }

    pub fn from_config(config: &FsConfig) -> FsResult<Self> {
        let console = FileSystemConsole::from_config(config)?;
        Ok(Self::new(console, config.notification_capacity))
    }

    /// Runs one command on behalf of `user` from `current_directory`.
    ///
    /// Returns the resolved path, the printed tree for `print`, or an empty
    /// string for copy and move.
    pub async fn execute(
        &self,
        user: &UserName,
        current_directory: &str,
        command: &Command,
    ) -> FsResult<String> {
        debug!(user = %user, command = %command, "executing");
        let cd = current_directory;
        match command {
            Command::ChangeDirectory { path } => self.console.read().await.change_directory(cd, path),
            Command::PrintTree => self.console.read().await.print_tree(false),
            Command::MakeDirectory { path } => self.console.write().await.make_directory(cd, path),
            Command::RemoveDirectory { path } => self.console.write().await.remove_directory(cd, path),
            Command::DeleteTree { path } => self.console.write().await.delete_tree(cd, path),
            Command::MakeFile { path } => self.console.write().await.make_file(cd, path),
            Command::DeleteFile { path } => self.console.write().await.delete_file(cd, path),
            Command::LockFile { path } => {
                self.console.write().await.lock_file(user.as_str(), cd, path)
            }
            Command::UnlockFile { path } => {
                self.console.write().await.unlock_file(user.as_str(), cd, path)
            }
            Command::Copy { source, dest } => self
                .console
                .write()
                .await
                .copy(cd, source, dest)
                .map(|()| String::new()),
            Command::Move { source, dest } => self
                .console
                .write()
                .await
                .move_item(cd, source, dest)
                .map(|()| String::new()),
        }
    }

    pub async fn print_tree(&self, print_root: bool) -> FsResult<String> {
        self.console.read().await.print_tree(print_root)
    }

    /// Announces a performed command; returns how many subscribers got it.
    pub fn publish(&self, data: CommandPerformedData) -> usize {
        self.events.send(data).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandPerformedData> {
        self.events.subscribe()
    }
}
