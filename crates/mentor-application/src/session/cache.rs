use super::SessionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory cache of live session handles.
///
/// A session is loaded from storage at most once; every later turn for the
/// same id goes through the cached handle and therefore through its mutex.
#[derive(Clone, Default)]
pub struct SessionCache {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionCache {
    /// Creates a new empty SessionCache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached handle by session ID.
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Inserts a handle unless one is already cached, returning the cached one.
    pub async fn insert_if_absent(&self, session_id: String, handle: SessionHandle) -> SessionHandle {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id).or_insert(handle).clone()
    }

    /// Removes a handle from the cache.
    pub async fn remove(&self, session_id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
