use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::is_valid_session_id;
use crate::session::models::{AnalysisResult, ChatTurn, ImageRecord, Session, SessionSnapshot};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} is not active")]
    NotFound(String),
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Live sessions in memory, mirrored to one JSON snapshot per session.
///
/// Every mutation writes its snapshot before the lock is released, so
/// snapshots for a session land in the same order as the mutations. A
/// mutation whose snapshot cannot be written leaves memory unchanged.
pub struct SessionStore {
    sessions_dir: PathBuf,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(sessions_dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir)?;
        info!("Session snapshots stored in {}", sessions_dir.display());

        Ok(Self {
            sessions_dir,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn snapshot_path(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(format!("{}.json", session_id))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // A panic mid-mutation can only leave a fully appended or untouched
        // history behind, so the map is still usable.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_session(&self) -> Result<String, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let session = Session::new();
        let mut sessions = self.lock();
        self.write_snapshot(&session_id, &session)?;
        sessions.insert(session_id.clone(), session);
        info!("Created session {}", session_id);
        Ok(session_id)
    }

    /// Creates `session_id` unless it is already live. Calling this twice
    /// leaves the history of the first call untouched.
    pub fn create_session_with_id(&self, session_id: &str) -> Result<String, SessionError> {
        let mut sessions = self.lock();
        if !sessions.contains_key(session_id) {
            let session = Session::new();
            self.write_snapshot(session_id, &session)?;
            sessions.insert(session_id.to_string(), session);
            info!("Created session {} with caller supplied id", session_id);
        }
        Ok(session_id.to_string())
    }

    /// True only for sessions held in memory, not for ids that merely have a
    /// snapshot on disk.
    pub fn exists(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Number of sessions currently held in memory.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    pub fn add_chat(&self, session_id: &str, role: &str, text: &str) -> Result<(), SessionError> {
        self.mutate(session_id, |session| {
            session.chat_history.push(ChatTurn::new(role, text));
        })
    }

    /// Appends a user question and its answer as two adjacent turns.
    /// Concurrent exchanges on the same session never interleave.
    pub fn add_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), SessionError> {
        self.mutate(session_id, |session| {
            session.chat_history.push(ChatTurn::new("user", question));
            session.chat_history.push(ChatTurn::new("bot", answer));
        })
    }

    pub fn add_image_analysis(
        &self,
        session_id: &str,
        filename: &str,
        analysis: AnalysisResult,
    ) -> Result<(), SessionError> {
        self.mutate(session_id, |session| {
            session.image_history.push(ImageRecord {
                filename: filename.to_string(),
                analysis,
            });
        })
    }

    pub fn get_history(&self, session_id: &str) -> Option<Session> {
        self.lock().get(session_id).cloned()
    }

    /// Removes the session from the live set and returns its final state.
    /// Returns `None` when the session is not live, including on a second
    /// call for the same id.
    pub fn end_session(&self, session_id: &str) -> Result<Option<Session>, SessionError> {
        let mut sessions = self.lock();
        let Some(session) = sessions.remove(session_id) else {
            return Ok(None);
        };
        if let Err(e) = self.write_snapshot(session_id, &session) {
            sessions.insert(session_id.to_string(), session);
            return Err(e);
        }
        info!(
            "Ended session {} ({} chat turns, {} images)",
            session_id,
            session.chat_history.len(),
            session.image_history.len()
        );
        Ok(Some(session))
    }

    /// Reads the on-disk snapshot for `session_id`, if there is one.
    pub fn read_snapshot(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        if !is_valid_session_id(session_id) {
            return Ok(None);
        }
        let path = self.snapshot_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(Some(SessionSnapshot::from_value(value)))
    }

    /// Ids of every session that has a snapshot, live or not, sorted.
    pub fn list_snapshots(&self) -> Result<Vec<String>, SessionError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.sessions_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn mutate<F>(&self, session_id: &str, apply: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.lock();
        let mut next = sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        apply(&mut next);
        self.write_snapshot(session_id, &next)?;
        sessions.insert(session_id.to_string(), next);
        Ok(())
    }

    /// Must be called with the store lock held.
    fn write_snapshot(&self, session_id: &str, session: &Session) -> Result<(), SessionError> {
        let path = self.snapshot_path(session_id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}
