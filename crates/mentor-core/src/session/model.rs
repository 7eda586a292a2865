//! Session domain model.

use super::message::{Turn, TurnRole};
use crate::challenge::CooldownLedger;
use crate::challenge::ChallengeFamily;
use crate::error::{MentorError, Result};
use crate::phase::{PhaseModel, PhaseTracker};
use crate::routing::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Self-declared experience of the learner, fixed at session creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// One tutoring conversation.
///
/// Mutated only by the turn orchestrator, at its checkpoints. Everything in
/// here is serializable so that a conversation can be resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub skill_level: SkillLevel,
    pub phase: PhaseTracker,
    pub turns: Vec<Turn>,
    pub cooldowns: CooldownLedger,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        skill_level: SkillLevel,
        phase_model: PhaseModel,
        min_turns_per_phase: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            skill_level,
            phase: PhaseTracker::new(phase_model, min_turns_per_phase),
            turns: Vec::new(),
            cooldowns: CooldownLedger::default(),
        }
    }

    /// Number of learner turns recorded so far.
    pub fn learner_turn_count(&self) -> u32 {
        self.turns.iter().filter(|t| t.is_learner()).count() as u32
    }

    /// The last `n` turns, oldest first.
    pub fn history_window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Routes of the last `n` tutor turns, oldest first.
    pub fn recent_routes(&self, n: usize) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .turns
            .iter()
            .rev()
            .filter(|t| t.role == TurnRole::Tutor)
            .filter_map(|t| t.route)
            .take(n)
            .collect();
        routes.reverse();
        routes
    }

    pub fn last_learner_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.is_learner())
            .map(|t| t.text.as_str())
    }

    pub fn push_learner(&mut self, text: impl Into<String>, image_summary: Option<String>) {
        self.turns
            .push(Turn::learner(text).with_image_summary(image_summary));
        self.touch();
    }

    pub fn push_tutor(
        &mut self,
        text: impl Into<String>,
        route: Route,
        challenge_family: Option<ChallengeFamily>,
    ) {
        self.turns
            .push(Turn::tutor(text, Some(route), challenge_family));
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Checks invariants that must hold for any persisted session.
    ///
    /// A violation means the stored state cannot be trusted and is reported as
    /// [`MentorError::SessionCorruption`].
    pub fn validate(&self) -> Result<()> {
        let corrupt = |message: String| MentorError::session_corruption(&self.id, message);

        if self.id.trim().is_empty() {
            return Err(corrupt("empty session id".to_string()));
        }
        if self.updated_at < self.created_at {
            return Err(corrupt("updated_at precedes created_at".to_string()));
        }
        self.phase.validate().map_err(corrupt)?;

        let learner_turns = self.learner_turn_count();
        if self.phase.learner_turns() > learner_turns {
            return Err(corrupt(format!(
                "phase tracker counted {} learner turns but only {} are stored",
                self.phase.learner_turns(),
                learner_turns
            )));
        }
        self.cooldowns.validate(learner_turns).map_err(corrupt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("s-1", SkillLevel::Beginner, PhaseModel::FivePhase, 3)
    }

    #[test]
    fn test_history_window_and_routes() {
        let mut s = session();
        s.push_learner("hello", None);
        s.push_tutor("hi", Route::ProgressiveOpening, None);
        s.push_learner("what is a parti?", None);
        s.push_tutor("a parti is...", Route::KnowledgeOnly, None);

        assert_eq!(s.learner_turn_count(), 2);
        assert_eq!(s.history_window(3).len(), 3);
        assert_eq!(s.history_window(10).len(), 4);
        assert_eq!(
            s.recent_routes(5),
            vec![Route::ProgressiveOpening, Route::KnowledgeOnly]
        );
        assert_eq!(s.recent_routes(1), vec![Route::KnowledgeOnly]);
        assert_eq!(s.last_learner_text(), Some("what is a parti?"));
    }

    #[test]
    fn test_blank_image_summary_is_dropped() {
        let mut s = session();
        s.push_learner("see my sketch", Some("   ".to_string()));
        assert!(s.turns[0].image_summary.is_none());
    }

    #[test]
    fn test_fresh_session_is_valid() {
        assert!(session().validate().is_ok());
    }

    #[test]
    fn test_validate_flags_ledger_from_the_future() {
        let mut s = session();
        s.push_learner("hello", None);
        s.cooldowns
            .record_fire(ChallengeFamily::RolePlay, "abc", 5);
        let err = s.validate().unwrap_err();
        assert!(err.is_session_corruption());
    }
}
