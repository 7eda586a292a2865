//! Conversation turn types.

use crate::challenge::ChallengeFamily;
use crate::routing::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnRole {
    /// The learner.
    Learner,
    /// The tutoring engine.
    Tutor,
}

/// A single turn in a conversation.
///
/// Tutor turns remember the route that produced them and, when the reply was
/// a gamified challenge, the challenge family. Both feed later routing
/// decisions (stagnation detection, cooldowns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_family: Option<ChallengeFamily>,
    /// Textual summary of an attached image, if the learner sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_summary: Option<String>,
}

impl Turn {
    pub fn learner(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Learner,
            text: text.into(),
            timestamp: Utc::now(),
            route: None,
            challenge_family: None,
            image_summary: None,
        }
    }

    pub fn tutor(
        text: impl Into<String>,
        route: Option<Route>,
        challenge_family: Option<ChallengeFamily>,
    ) -> Self {
        Self {
            role: TurnRole::Tutor,
            text: text.into(),
            timestamp: Utc::now(),
            route,
            challenge_family,
            image_summary: None,
        }
    }

    pub fn with_image_summary(mut self, summary: Option<String>) -> Self {
        self.image_summary = summary.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn is_learner(&self) -> bool {
        self.role == TurnRole::Learner
    }
}
