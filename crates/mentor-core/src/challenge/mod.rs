//! Challenge Trigger Controller.
//!
//! Decides whether a turn escalates into a gamified cognitive challenge, picks
//! the challenge family, and enforces anti-repetition through a per-session
//! [`CooldownLedger`] keyed by (family, context hash).

pub mod catalog;
mod controller;
mod ledger;

pub use catalog::ChallengePayload;
pub use controller::{ChallengeController, Escalation, EscalationOutcome};
pub use ledger::{CooldownEntry, CooldownLedger, SuppressionReason};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Category of gamified challenge.
///
/// Declaration order is selection priority: when an utterance matches the
/// patterns of several families, the earliest one wins.
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
pub enum ChallengeFamily {
    RolePlay,
    Detective,
    CreativeConstraint,
    PerspectiveShift,
    Storytelling,
    TimeTravel,
    Transformation,
    GenericReflection,
}

impl ChallengeFamily {
    fn patterns(self) -> &'static [&'static str] {
        match self {
            ChallengeFamily::RolePlay => &[
                "role play",
                "role-play",
                "roleplay",
                "pretend",
                "act as",
                "imagine you are",
                "imagine i am",
                "play the role",
            ],
            ChallengeFamily::Detective => &[
                "mystery",
                "investigate",
                "figure out why",
                "what's wrong",
                "what is wrong",
                "problem with",
                "clue",
                "diagnose",
            ],
            ChallengeFamily::CreativeConstraint => &[
                "stuck",
                "constraint",
                "limited budget",
                "can't think",
                "cannot think",
                "no ideas",
                "out of ideas",
                "blank",
            ],
            ChallengeFamily::PerspectiveShift => &[
                "perspective",
                "point of view",
                "through the eyes",
                "how would a",
                "how might a",
                "for everyone",
                "users",
                "visitors",
            ],
            ChallengeFamily::Storytelling => &[
                "story",
                "narrative",
                "journey",
                "walk through",
                "experience of",
            ],
            ChallengeFamily::TimeTravel => &[
                "future",
                "years from now",
                "decades",
                "over time",
                "history",
                "in the past",
            ],
            ChallengeFamily::Transformation => &[
                "transform",
                "adapt",
                "flexible",
                "reuse",
                "convert",
                "change over",
            ],
            ChallengeFamily::GenericReflection => &[],
        }
    }

    /// First family, in priority order, whose patterns occur in `text`.
    pub fn detect(text: &str) -> Option<ChallengeFamily> {
        ChallengeFamily::iter().find(|family| family.patterns().iter().any(|p| text.contains(p)))
    }
}

/// Why a challenge was considered for this turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChallengeTrigger {
    Overconfidence,
    LowEngagement,
    Curiosity,
    PerspectiveSeeking,
    CreativeBlock,
    Stagnation,
    EngagementBoost,
    /// The learner literally asked for a challenge, role-play or perspective exercise.
    ExplicitRequest,
}

impl ChallengeTrigger {
    /// Family used when the utterance matches no family pattern.
    pub fn default_family(self) -> ChallengeFamily {
        match self {
            ChallengeTrigger::Overconfidence => ChallengeFamily::PerspectiveShift,
            ChallengeTrigger::LowEngagement => ChallengeFamily::Detective,
            ChallengeTrigger::Curiosity => ChallengeFamily::TimeTravel,
            ChallengeTrigger::PerspectiveSeeking => ChallengeFamily::PerspectiveShift,
            ChallengeTrigger::CreativeBlock => ChallengeFamily::CreativeConstraint,
            ChallengeTrigger::Stagnation => ChallengeFamily::Transformation,
            ChallengeTrigger::EngagementBoost => ChallengeFamily::Storytelling,
            ChallengeTrigger::ExplicitRequest => ChallengeFamily::GenericReflection,
        }
    }
}
