//! File-backed session store: one JSON document per session.
//!
//! Writes go through a temp file followed by an atomic rename so a crash
//! mid-write never leaves a truncated session on disk.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::models::Session;
use crate::store::SessionStore;

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .map_err(|e| EngineError::Store(format!("failed to create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn put(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| EngineError::Store(format!("failed to serialize session: {e}")))?;

        let path = self.path_for(&session.id);
        let temp = self.dir.join(format!(".{}.json.tmp", session.id));

        fs::write(&temp, &json)
            .map_err(|e| EngineError::Store(format!("failed to write temp file: {e}")))?;
        fs::rename(&temp, &path)
            .map_err(|e| EngineError::Store(format!("failed to rename session file: {e}")))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| EngineError::Store(format!("failed to read session file: {e}")))?;
        let session = serde_json::from_str(&json)
            .map_err(|e| EngineError::Store(format!("failed to parse session file: {e}")))?;
        Ok(Some(session))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| EngineError::Store(format!("failed to read {}: {e}", self.dir.display())))?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| EngineError::Store(format!("failed to read entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // A single unreadable file should not hide the rest.
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| serde_json::from_str::<Session>(&json).map_err(|e| e.to_string()))
            {
                Ok(session) if session.user_id == user_id => sessions.push(session),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable session file {:?}: {}", path, e),
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}
