//! In-memory session state. Nothing here outlives the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;

/// Key under which pasted project descriptions are kept alongside harvested READMEs.
pub const MANUAL_PROJECTS_KEY: &str = "manual_projects";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything one interactive user has built up so far.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub resume_text: Option<String>,
    /// Project name → summary. Manual descriptions live under `manual_projects`.
    pub project_summaries: IndexMap<String, String>,
    pub document: Option<ResumeDocument>,
    pub transcript: Vec<TranscriptEntry>,
    pub turn: TurnState,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            resume_text: None,
            project_summaries: IndexMap::new(),
            document: None,
            transcript: Vec::new(),
            turn: TurnState::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.turn == TurnState::Processing
    }

    /// Fails with `Conflict` while a chat turn is in flight.
    pub fn ensure_idle(&self) -> Result<(), AppError> {
        if self.is_busy() {
            return Err(AppError::Conflict(
                "A chat edit is still being processed for this session".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared handle to all live sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Session {
        let session = Session::new();
        self.inner.write().insert(session.id, session.clone());
        info!("Session {} created", session.id);
        session
    }

    /// Tears a session down. Returns false if it did not exist.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.write().remove(&id).is_some();
        if removed {
            info!("Session {} removed", id);
        }
        removed
    }

    pub fn snapshot(&self, id: Uuid) -> Result<Session, AppError> {
        self.inner
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Runs `f` against the session under the write lock.
    pub fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.inner.write();
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        f(session)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
