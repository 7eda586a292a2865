//! Configuration loading.
//!
//! Layering, lowest precedence first: built-in defaults, the config file
//! (`~/.config/mentor/config.toml` or an explicit path), then environment
//! variables. The merged result is validated before it is handed out.

use crate::paths::MentorPaths;
use crate::storage::{AtomicTomlError, AtomicTomlFile};
use mentor_core::config::{LlmProvider, MentorConfig};
use mentor_core::error::{MentorError, Result};
use std::path::{Path, PathBuf};

pub const ENV_LLM_PROVIDER: &str = "MENTOR_LLM_PROVIDER";
pub const ENV_LLM_MODEL: &str = "MENTOR_LLM_MODEL";
pub const ENV_KNOWLEDGE_ENDPOINT: &str = "MENTOR_KNOWLEDGE_ENDPOINT";
pub const ENV_SESSIONS_DIR: &str = "MENTOR_SESSIONS_DIR";

pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for the default config file location.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
        }
    }

    /// Loader for a file given on the command line. The file must exist.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_path: Some(path.into()),
        }
    }

    /// Loads the layered configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns `MentorError::Config` if an explicit file is missing, a file
    /// cannot be parsed, an environment value is invalid, or the merged
    /// configuration fails validation.
    pub fn load(&self) -> Result<MentorConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env(&self, env: impl Fn(&str) -> Option<String>) -> Result<MentorConfig> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, env)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(&self) -> Result<MentorConfig> {
        let (path, required) = match &self.explicit_path {
            Some(path) => (path.clone(), true),
            None => match MentorPaths::config_file() {
                Ok(path) => (path, false),
                Err(e) => {
                    tracing::debug!("No config directory ({}), using defaults", e);
                    return Ok(MentorConfig::default());
                }
            },
        };

        match read_config(&path)? {
            Some(config) => {
                tracing::debug!("Loaded configuration from {:?}", path);
                Ok(config)
            }
            None if required => Err(MentorError::config(format!(
                "config file {} does not exist",
                path.display()
            ))),
            None => Ok(MentorConfig::default()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config(path: &Path) -> Result<Option<MentorConfig>> {
    AtomicTomlFile::<MentorConfig>::new(path)
        .load()
        .map_err(|e| match e {
            AtomicTomlError::Parse(err) => {
                MentorError::config(format!("{}: {}", path.display(), err))
            }
            other => MentorError::io(other.to_string()),
        })
}

/// Applies the `MENTOR_*` environment variables on top of `config`.
pub fn apply_env_overrides(
    config: &mut MentorConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let non_blank = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(provider) = non_blank(ENV_LLM_PROVIDER) {
        config.llm.provider = match provider.trim().to_ascii_lowercase().as_str() {
            "offline" => LlmProvider::Offline,
            "claude" => LlmProvider::Claude,
            other => {
                return Err(MentorError::config(format!(
                    "{ENV_LLM_PROVIDER}: unknown provider '{other}'"
                )));
            }
        };
    }
    if let Some(model) = non_blank(ENV_LLM_MODEL) {
        config.llm.model = model;
    }
    if let Some(endpoint) = non_blank(ENV_KNOWLEDGE_ENDPOINT) {
        config.knowledge.endpoint = Some(endpoint);
    }
    if let Some(dir) = non_blank(ENV_SESSIONS_DIR) {
        config.storage.sessions_dir = Some(PathBuf::from(dir));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[challenge]\ncooldown_window_turns = 4\n\n[llm]\nmodel = \"from-file\"\n",
        )
        .unwrap();

        let config = ConfigLoader::with_path(&path).load_with_env(env(&[])).unwrap();
        assert_eq!(config.challenge.cooldown_window_turns, 4);
        assert_eq!(config.challenge.engagement_boost_every, 3);
        assert_eq!(config.llm.model, "from-file");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

        let config = ConfigLoader::with_path(&path)
            .load_with_env(env(&[
                (ENV_LLM_PROVIDER, "Claude"),
                (ENV_LLM_MODEL, "from-env"),
                (ENV_KNOWLEDGE_ENDPOINT, "http://localhost:8080/search"),
                (ENV_SESSIONS_DIR, "/tmp/mentor-sessions"),
            ]))
            .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(
            config.knowledge.endpoint.as_deref(),
            Some("http://localhost:8080/search")
        );
        assert_eq!(
            config.storage.sessions_dir,
            Some(PathBuf::from("/tmp/mentor-sessions"))
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::with_path(dir.path().join("absent.toml"))
            .load_with_env(env(&[]))
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dispatch]\nresponder_timeout_ms = 0\n").unwrap();
        assert!(
            ConfigLoader::with_path(&path)
                .load_with_env(env(&[]))
                .unwrap_err()
                .is_config()
        );

        let mut config = MentorConfig::default();
        let err = apply_env_overrides(&mut config, env(&[(ENV_LLM_PROVIDER, "gpt")])).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[phase\nmodel = ").unwrap();
        assert!(
            ConfigLoader::with_path(&path)
                .load_with_env(env(&[]))
                .unwrap_err()
                .is_config()
        );
    }
}
