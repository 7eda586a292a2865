//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use anyhow::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// Implementations must reject persisted state they cannot trust with
/// [`MentorError::SessionCorruption`](crate::error::MentorError::SessionCorruption)
/// so that the caller can start a fresh session instead.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Storage failure or corrupted state
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session to storage, replacing any previous version.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage. Deleting a missing session is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions that can be loaded.
    ///
    /// Corrupted documents are skipped with a warning rather than failing the listing.
    async fn list_all(&self) -> Result<Vec<Session>>;
}
