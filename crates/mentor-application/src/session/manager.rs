use super::{SessionCache, SessionHandle};
use mentor_core::config::PhaseConfig;
use mentor_core::error::{MentorError, Result};
use mentor_core::session::{Session, SessionRepository, SkillLevel};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Manages session lifecycle: creation, resume, persistence and end.
///
/// `SessionManager` is responsible for:
/// - Creating new sessions with fresh ids
/// - Loading sessions from storage (rejecting corrupted state)
/// - Caching live handles so that turns of one session are serialized
/// - Persisting session state after each completed turn
pub struct SessionManager {
    cache: SessionCache,
    repository: Arc<dyn SessionRepository>,
    phase: PhaseConfig,
}

impl SessionManager {
    /// Creates a new `SessionManager` with a repository backend.
    ///
    /// # Arguments
    ///
    /// * `repository` - Persistent storage for session documents
    /// * `phase` - Phase model and pacing used for newly created sessions
    pub fn new(repository: Arc<dyn SessionRepository>, phase: PhaseConfig) -> Self {
        Self {
            cache: SessionCache::new(),
            repository,
            phase,
        }
    }

    /// Creates and persists a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial save fails.
    pub async fn create(&self, skill_level: SkillLevel) -> Result<SessionHandle> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(
            id.clone(),
            skill_level,
            self.phase.model,
            self.phase.min_turns_per_phase,
        );
        self.repository.save(&session).await?;
        tracing::info!(session_id = %id, skill = %skill_level, "Session created");

        let handle = Arc::new(Mutex::new(session));
        Ok(self.cache.insert_if_absent(id, handle).await)
    }

    /// Returns the live handle for `session_id`, loading it from storage if needed.
    ///
    /// # Errors
    ///
    /// - `MentorError::NotFound` if no such session exists
    /// - `MentorError::SessionCorruption` if the stored state cannot be trusted;
    ///   the caller should start a fresh session
    pub async fn load(&self, session_id: &str) -> Result<SessionHandle> {
        if let Some(handle) = self.cache.get(session_id).await {
            return Ok(handle);
        }

        let session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| MentorError::not_found("Session", session_id))?;
        session.validate()?;
        tracing::info!(
            session_id = %session.id,
            turns = session.turns.len(),
            phase = %session.phase.current_phase(),
            "Session resumed"
        );

        let handle = Arc::new(Mutex::new(session));
        Ok(self.cache.insert_if_absent(session_id.to_string(), handle).await)
    }

    /// Persists a session snapshot.
    pub async fn save(&self, session: &Session) -> Result<()> {
        self.repository.save(session).await?;
        Ok(())
    }

    /// Lists every loadable stored session.
    pub async fn list(&self) -> Result<Vec<Session>> {
        Ok(self.repository.list_all().await?)
    }

    /// Ends a session: drops its live handle and optionally deletes stored state.
    ///
    /// # Arguments
    ///
    /// * `session_id` - The session to end
    /// * `delete` - Also remove the persisted document
    pub async fn end(&self, session_id: &str, delete: bool) -> Result<()> {
        self.cache.remove(session_id).await;
        if delete {
            self.repository.delete(session_id).await?;
        }
        tracing::info!(session_id = %session_id, deleted = delete, "Session ended");
        Ok(())
    }

    pub fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.repository
    }
}
