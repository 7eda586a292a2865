//! TOML-based SessionRepository implementation

use crate::dto::SessionDocument;
use crate::paths::MentorPaths;
use crate::storage::AtomicTomlFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use mentor_core::config::StorageConfig;
use mentor_core::session::{Session, SessionRepository};
use std::fs;
use std::path::{Path, PathBuf};

/// A repository storing each session as one TOML document.
///
/// ```text
/// sessions_dir/
/// ├── <session-id-1>.toml
/// └── <session-id-2>.toml
/// ```
///
/// Documents carry a `schema_version`; anything that cannot be trusted on
/// load is reported as `MentorError::SessionCorruption`.
#[derive(Debug, Clone)]
pub struct TomlSessionRepository {
    sessions_dir: PathBuf,
}

impl TomlSessionRepository {
    /// Creates a repository rooted at `sessions_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(sessions_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir)
            .with_context(|| format!("Failed to create sessions directory {:?}", sessions_dir))?;
        Ok(Self { sessions_dir })
    }

    /// Creates a repository at the configured location, or `~/.config/mentor/sessions`.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match &config.sessions_dir {
            Some(dir) => Self::new(dir),
            None => Self::new(MentorPaths::sessions_dir()?),
        }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn session_file(&self, session_id: &str) -> Result<AtomicTomlFile<SessionDocument>> {
        if !is_valid_id(session_id) {
            anyhow::bail!("Invalid session id '{}'", session_id);
        }
        Ok(AtomicTomlFile::new(
            self.sessions_dir.join(format!("{}.toml", session_id)),
        ))
    }
}

/// Session ids become file names; only plain identifier characters are allowed.
fn is_valid_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn load_from(file: &AtomicTomlFile<SessionDocument>, session_id: &str) -> Result<Option<Session>> {
    let Some(content) = file
        .read_raw()
        .with_context(|| format!("Failed to read session file {:?}", file.path()))?
    else {
        return Ok(None);
    };
    Ok(Some(SessionDocument::parse(&content, session_id)?))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Session storage task panicked")?
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        if !is_valid_id(session_id) {
            return Ok(None);
        }
        let file = self.session_file(session_id)?;
        let id = session_id.to_string();
        blocking(move || load_from(&file, &id)).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let file = self.session_file(&session.id)?;
        let document = SessionDocument::from_domain(session);
        blocking(move || {
            file.save(&document)
                .with_context(|| format!("Failed to write session file {:?}", file.path()))
        })
        .await?;
        tracing::debug!("Saved session {}", session.id);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let file = self.session_file(session_id)?;
        blocking(move || {
            file.remove()
                .with_context(|| format!("Failed to delete session file {:?}", file.path()))
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let dir = self.sessions_dir.clone();
        blocking(move || {
            let mut sessions = Vec::new();
            for entry in fs::read_dir(&dir).context("Failed to read sessions directory")? {
                let path = entry.context("Failed to read directory entry")?.path();
                if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match load_from(&AtomicTomlFile::new(path.clone()), id) {
                    Ok(Some(session)) => sessions.push(session),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!("Skipping unreadable session {:?}: {:#}", path, e);
                    }
                }
            }

            // Most recent first
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_restricted_to_file_safe_characters() {
        assert!(is_valid_id("0b5c1e4e-8f1a-4c53-9d2a-0f3c2b1a9e77"));
        assert!(is_valid_id("demo_1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../escape"));
        assert!(!is_valid_id("a/b"));
    }
}
