//! Session document DTO.

use mentor_core::error::MentorError;
use mentor_core::session::Session;
use serde::{Deserialize, Serialize};

/// Schema version written by this build.
pub const CURRENT_SESSION_SCHEMA: u32 = 1;

/// On-disk form of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub schema_version: u32,
    pub session: Session,
}

impl SessionDocument {
    pub fn from_domain(session: &Session) -> Self {
        Self {
            schema_version: CURRENT_SESSION_SCHEMA,
            session: session.clone(),
        }
    }

    /// Parses a stored document.
    ///
    /// The version is checked before the body so that a document written by
    /// a newer build is reported as such rather than as a parse failure.
    /// `file_id` is the id the file is stored under.
    pub fn parse(content: &str, file_id: &str) -> Result<Session, MentorError> {
        let corrupt = |message: String| MentorError::session_corruption(file_id, message);

        let table: toml::Table =
            toml::from_str(content).map_err(|e| corrupt(format!("invalid TOML: {e}")))?;
        match table.get("schema_version").and_then(toml::Value::as_integer) {
            Some(v) if v == i64::from(CURRENT_SESSION_SCHEMA) => {}
            Some(v) => return Err(corrupt(format!("unsupported schema_version {v}"))),
            None => return Err(corrupt("missing schema_version".to_string())),
        }

        let document: SessionDocument = toml::Value::Table(table)
            .try_into()
            .map_err(|e| corrupt(format!("invalid session document: {e}")))?;
        let session = document.session;
        if session.id != file_id {
            return Err(corrupt(format!(
                "document holds session '{}'",
                session.id
            )));
        }
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::phase::PhaseModel;
    use mentor_core::session::SkillLevel;

    fn session() -> Session {
        let mut s = Session::new("abc", SkillLevel::Beginner, PhaseModel::FivePhase, 3);
        s.push_learner("I want to design a library", None);
        s
    }

    #[test]
    fn test_document_parses_back() {
        let s = session();
        let text = toml::to_string_pretty(&SessionDocument::from_domain(&s)).unwrap();
        assert!(text.starts_with("schema_version = 1"));
        assert_eq!(SessionDocument::parse(&text, "abc").unwrap(), s);
    }

    #[test]
    fn test_future_schema_is_corruption() {
        let text = toml::to_string_pretty(&SessionDocument::from_domain(&session()))
            .unwrap()
            .replace("schema_version = 1", "schema_version = 7");
        let err = SessionDocument::parse(&text, "abc").unwrap_err();
        assert!(err.is_session_corruption());
        assert!(err.to_string().contains("unsupported schema_version 7"));
    }

    #[test]
    fn test_id_mismatch_is_corruption() {
        let text = toml::to_string_pretty(&SessionDocument::from_domain(&session())).unwrap();
        assert!(SessionDocument::parse(&text, "other").unwrap_err().is_session_corruption());
    }
}
