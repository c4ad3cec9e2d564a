//! Session lifecycle management.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use vfs_core::{path, UserName};
use vfs_proto::SessionToken;

/// An authorized user's connection state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub user_name: UserName,
    pub current_directory: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Create a new session positioned at the default volume.
    pub fn new(user_name: UserName) -> Self {
        let now = chrono::Utc::now();
        Self {
            token: SessionToken::new(),
            user_name,
            current_directory: path::default_volume().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tracks live sessions; at most one per user name (ignoring case).
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize `user_name` and start a session for it.
    pub async fn create_session(&self, user_name: &str) -> crate::Result<Session> {
        let user_name = UserName::new(user_name)?;
        let mut sessions = self.sessions.write().await;
        if sessions.values().any(|s| s.user_name == user_name) {
            return Err(crate::Error::already_authorized(user_name.as_str()));
        }

        let session = Session::new(user_name);
        sessions.insert(session.token, session.clone());
        info!(user = %session.user_name, "session started");
        Ok(session)
    }

    /// End a session.
    pub async fn remove_session(&self, token: SessionToken) -> crate::Result<Session> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&token)
            .ok_or(crate::Error::UnknownSession(token))?;
        info!(user = %session.user_name, "session ended");
        Ok(session)
    }

    pub async fn get_session(&self, token: SessionToken) -> crate::Result<Session> {
        self.sessions
            .read()
            .await
            .get(&token)
            .cloned()
            .ok_or(crate::Error::UnknownSession(token))
    }

    pub async fn set_current_directory(
        &self,
        token: SessionToken,
        current_directory: String,
    ) -> crate::Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&token)
            .ok_or(crate::Error::UnknownSession(token))?;
        session.current_directory = current_directory;
        session.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// List all sessions, oldest first.
    pub async fn list_sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }
}
