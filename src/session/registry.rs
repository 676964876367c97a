//! Live conversations keyed by session id

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::assistant::Assistant;
use crate::{Error, Result};

/// Exclusive handle to one live assistant
///
/// The mutex serializes tool calls within a conversation.
pub type SessionHandle = Arc<Mutex<Box<dyn Assistant>>>;

/// Registry of live conversations
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assistant under a fresh session id
    pub async fn insert(&self, assistant: Box<dyn Assistant>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let kind = assistant.kind();
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(assistant)));
        tracing::info!(session_id = %id, assistant = %kind, "session started");
        id
    }

    /// Look up a live session
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no session has this id
    pub async fn get(&self, id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Remove a session from the registry
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if no session has this id
    pub async fn remove(&self, id: &str) -> Result<SessionHandle> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        tracing::info!(session_id = %id, "session removed");
        Ok(handle)
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
