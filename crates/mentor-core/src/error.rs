//! Error types for the Mentor engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the Mentor workspace.
///
/// Per-turn failures (classification outages, responder timeouts) never reach
/// this type: they are absorbed by fallbacks inside the turn pipeline. What
/// remains are configuration, storage and session-lifecycle errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MentorError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted session state could not be trusted; the caller must start a fresh session.
    #[error("Session '{session_id}' is corrupted: {message}")]
    SessionCorruption { session_id: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MentorError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a SessionCorruption error
    pub fn session_corruption(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionCorruption {
            session_id: session_id.into(),
            message: message.into(),
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if persisted session state was rejected
    pub fn is_session_corruption(&self) -> bool {
        matches!(self, Self::SessionCorruption { .. })
    }
}

impl From<std::io::Error> for MentorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MentorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MentorError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error at repository boundaries
impl From<anyhow::Error> for MentorError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MentorError>() {
            Ok(mentor) => mentor,
            Err(other) => Self::Internal(other.to_string()),
        }
    }
}

/// A type alias for `Result<T, MentorError>`.
pub type Result<T> = std::result::Result<T, MentorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_round_trip_keeps_corruption_variant() {
        let err: anyhow::Error = MentorError::session_corruption("abc", "bad phase").into();
        let back = MentorError::from(err);
        assert!(back.is_session_corruption());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MentorError::from(io);
        assert!(matches!(err, MentorError::Io { .. }));
        assert!(err.to_string().contains("missing"));
    }
}
