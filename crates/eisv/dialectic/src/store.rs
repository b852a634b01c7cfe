//! Session persistence.
//!
//! Sessions outlive the process that opened them, so the protocol only
//! talks to a [`SessionStore`]. Two reference backends are provided.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::reviewer::ReviewerPredicates;
use crate::session::{DialecticSession, SessionPhase};

/// Pluggable storage backend for dialectic sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session.
    async fn save(&self, session: &DialecticSession) -> Result<(), StoreError>;

    async fn load(&self, id: &str) -> Result<Option<DialecticSession>, StoreError>;

    /// Every non-terminal session.
    async fn list_active(&self) -> Result<Vec<DialecticSession>, StoreError>;

    async fn list_all(&self) -> Result<Vec<DialecticSession>, StoreError>;

    /// Load a session that must exist.
    async fn get(&self, id: &str) -> Result<DialecticSession, StoreError> {
        self.load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn by_creation(mut sessions: Vec<DialecticSession>) -> Vec<DialecticSession> {
    sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    sessions
}

/// In-memory session storage for tests and single-process hosts.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, DialecticSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &DialecticSession) -> Result<(), StoreError> {
        let mut store = self
            .sessions
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        store.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<DialecticSession>, StoreError> {
        let store = self
            .sessions
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(store.get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<DialecticSession>, StoreError> {
        let store = self
            .sessions
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(by_creation(
            store.values().filter(|s| !s.is_terminal()).cloned().collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<DialecticSession>, StoreError> {
        let store = self
            .sessions
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(by_creation(store.values().cloned().collect()))
    }
}

/// One pretty-printed JSON document per session in a directory.
#[derive(Clone, Debug)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn save(&self, session: &DialecticSession) -> Result<(), StoreError> {
        let path = self.path_for(&session.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(session)?;
        // Write-then-rename so readers never see a partial document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(session_id = %session.id, path = %path.display(), "Session saved");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<DialecticSession>, StoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_active(&self) -> Result<Vec<DialecticSession>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|s| !s.is_terminal())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<DialecticSession>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            sessions.push(serde_json::from_slice(&bytes)?);
        }
        Ok(by_creation(sessions))
    }
}

/// [`ReviewerPredicates`] answered from a [`SessionStore`].
pub struct ActiveSessionRegistry<S: ?Sized> {
    store: Arc<S>,
}

impl<S: SessionStore + ?Sized> ActiveSessionRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SessionStore + ?Sized> ReviewerPredicates for ActiveSessionRegistry<S> {
    async fn is_in_active_session(&self, agent_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .list_active()
            .await?
            .iter()
            .any(|s| s.is_participant(agent_id)))
    }

    async fn has_recently_reviewed(
        &self,
        reviewer: &str,
        paused: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let cutoff = now - window;
        Ok(self.store.list_all().await?.iter().any(|s| {
            s.phase == SessionPhase::Resolved
                && s.reviewer == reviewer
                && s.paused_agent == paused
                && s.resolution
                    .as_ref()
                    .map_or(s.last_activity, |r| r.timestamp)
                    >= cutoff
        }))
    }
}
