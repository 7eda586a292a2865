//! Session lifecycle services.

mod cache;
mod manager;

pub use cache::SessionCache;
pub use manager::SessionManager;

use mentor_core::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to a live session.
///
/// The mutex serializes turns of one session; different sessions run
/// independently.
pub type SessionHandle = Arc<Mutex<Session>>;
