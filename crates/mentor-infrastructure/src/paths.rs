//! Unified path management for mentor files.
//!
//! ```text
//! ~/.config/mentor/            # Config directory
//! ├── config.toml              # Engine configuration
//! └── sessions/                # One TOML document per session
//!     └── <session-id>.toml
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Neither the platform config directory nor the home directory could be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

const APP_DIR: &str = "mentor";

/// Well-known locations of mentor files.
pub struct MentorPaths;

impl MentorPaths {
    /// Returns the mentor configuration directory (e.g. `~/.config/mentor/`).
    ///
    /// Falls back to `~/.mentor` on platforms without a config directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        if let Some(dir) = dirs::config_dir() {
            return Ok(dir.join(APP_DIR));
        }
        dirs::home_dir()
            .map(|home| home.join(format!(".{APP_DIR}")))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default session directory.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("sessions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_config_dir() {
        let Ok(dir) = MentorPaths::config_dir() else {
            return;
        };
        assert!(dir.ends_with("mentor") || dir.ends_with(".mentor"));
        assert_eq!(MentorPaths::config_file().unwrap(), dir.join("config.toml"));
        assert_eq!(MentorPaths::sessions_dir().unwrap(), dir.join("sessions"));
    }
}
