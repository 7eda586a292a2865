//! Specialist responders and their per-turn outputs.

use crate::challenge::ChallengePayload;
use crate::classification::Classification;
use crate::context::DomainContext;
use crate::phase::Phase;
use crate::routing::Route;
use crate::session::{SkillLevel, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Role of a specialist responder.
///
/// Declaration order is the fixed contribution order inside a reply.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponderRole {
    Socratic,
    Knowledge,
    Cognitive,
    Synthesis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub similarity: f32,
}

/// Everything a responder may look at. Shared read-only by all roles of a turn.
#[derive(Debug, Clone)]
pub struct ResponderRequest {
    pub utterance: String,
    pub route: Route,
    pub classification: Classification,
    pub phase: Phase,
    pub skill_level: SkillLevel,
    /// Bounded window of earlier turns, oldest first.
    pub history: Vec<Turn>,
    pub domain: DomainContext,
    /// Challenge chosen by the trigger controller, if one fired.
    pub challenge: Option<ChallengePayload>,
    pub image_summary: Option<String>,
}

/// A successful responder answer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponderReply {
    pub text: String,
    pub citations: Vec<Citation>,
    pub challenge: Option<ChallengePayload>,
}

impl ResponderReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponderError {
    #[error("responder timed out after {0:?}")]
    Timeout(Duration),

    #[error("responder failed: {0}")]
    Failed(String),

    #[error("responder returned an empty payload")]
    EmptyPayload,

    #[error("responder call was cancelled")]
    Cancelled,
}

/// Result of one dispatch call, success or not.
///
/// Consumed once by the synthesizer and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponderOutput {
    pub role: ResponderRole,
    pub text: String,
    pub citations: Vec<Citation>,
    pub challenge: Option<ChallengePayload>,
    pub success: bool,
    pub latency: Duration,
    pub failure: Option<ResponderError>,
}

impl ResponderOutput {
    pub fn succeeded(role: ResponderRole, reply: ResponderReply, latency: Duration) -> Self {
        Self {
            role,
            text: reply.text,
            citations: reply.citations,
            challenge: reply.challenge,
            success: true,
            latency,
            failure: None,
        }
    }

    pub fn failed(role: ResponderRole, error: ResponderError, latency: Duration) -> Self {
        Self {
            role,
            text: String::new(),
            citations: Vec::new(),
            challenge: None,
            success: false,
            latency,
            failure: Some(error),
        }
    }

    /// Successful and carrying non-blank text.
    pub fn is_usable(&self) -> bool {
        self.success && !self.text.trim().is_empty()
    }
}

/// A specialist producing one facet of a reply.
#[async_trait]
pub trait Responder: Send + Sync {
    fn role(&self) -> ResponderRole;

    /// Typical latency, used to decide whether an optional call fits the turn budget.
    fn estimated_latency(&self) -> Duration {
        Duration::from_secs(2)
    }

    async fn respond(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_role_priority_order() {
        let roles: Vec<_> = ResponderRole::iter().collect();
        assert_eq!(
            roles,
            vec![
                ResponderRole::Socratic,
                ResponderRole::Knowledge,
                ResponderRole::Cognitive,
                ResponderRole::Synthesis
            ]
        );
        assert!(ResponderRole::Socratic < ResponderRole::Synthesis);
    }

    #[test]
    fn test_failed_output_is_not_usable() {
        let out = ResponderOutput::failed(
            ResponderRole::Knowledge,
            ResponderError::EmptyPayload,
            Duration::from_millis(5),
        );
        assert!(!out.is_usable());
        let blank = ResponderOutput::succeeded(
            ResponderRole::Socratic,
            ResponderReply::text("  "),
            Duration::ZERO,
        );
        assert!(!blank.is_usable());
    }
}
