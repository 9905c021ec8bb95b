//! Session store abstraction.
//!
//! The engine holds no global state; it is handed a store at construction,
//! enabling test doubles and alternative backends. Every operation upserts
//! by session id; ordering of `list_for_user` is newest first.

mod json_file;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::Session;

pub use json_file::JsonFileStore;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert a session by identifier.
    async fn put(&self, session: &Session) -> Result<()>;

    /// Fetch a session, or None if it was never stored.
    async fn get(&self, id: &str) -> Result<Option<Session>>;

    /// Sessions owned by the given user, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>>;
}

/// In-memory store backed by a read-write-locked map. The default test
/// double; also usable for single-process callers that accept losing
/// sessions on restart.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
