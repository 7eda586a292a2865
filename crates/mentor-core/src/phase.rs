//! Phase state machine for tracking the learner's macro design phase.
//!
//! Phases only move forward. A transition happens when the learner has spent
//! at least `min_turns` turns in the current phase *and* the current turn
//! carries the readiness signal of the next phase (for example synthesis
//! language while exploring). The last phase is terminal.

use crate::classification::InteractionType;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A macro design phase.
///
/// The five-phase and three-phase models share one enum; a [`PhaseModel`]
/// decides which subset is in play and in what order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Discovery,
    Exploration,
    Synthesis,
    Application,
    Reflection,
    Ideation,
    Visualization,
    Materialization,
}

impl Phase {
    /// Phrases that signal the learner is ready to *enter* this phase.
    fn readiness_phrases(self) -> &'static [&'static str] {
        match self {
            Phase::Discovery | Phase::Ideation => &[],
            Phase::Exploration => &[
                "what if",
                "alternative",
                "option",
                "explore",
                "different approach",
                "compare",
                "could i try",
            ],
            Phase::Synthesis => &[
                "combine",
                "bring together",
                "integrate",
                "overall concept",
                "tie together",
                "unify",
                "merge",
                "synthes",
            ],
            Phase::Application => &[
                "apply",
                "detail",
                "material",
                "construct",
                "implement",
                "specification",
                "build it",
            ],
            Phase::Reflection => &[
                "reflect",
                "looking back",
                "learned",
                "lesson",
                "in hindsight",
                "what went well",
            ],
            Phase::Visualization => &[
                "sketch",
                "draw",
                "visualiz",
                "diagram",
                "floor plan",
                "section",
                "render",
                "massing",
            ],
            Phase::Materialization => &[
                "material",
                "construct",
                "detail",
                "fabricat",
                "assembly",
                "structure",
                "build",
            ],
        }
    }
}

/// Which ordered phase sequence a session follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseModel {
    #[default]
    FivePhase,
    ThreePhase,
}

impl PhaseModel {
    /// Phases in the order they are visited.
    pub fn phases(self) -> &'static [Phase] {
        match self {
            PhaseModel::FivePhase => &[
                Phase::Discovery,
                Phase::Exploration,
                Phase::Synthesis,
                Phase::Application,
                Phase::Reflection,
            ],
            PhaseModel::ThreePhase => &[
                Phase::Ideation,
                Phase::Visualization,
                Phase::Materialization,
            ],
        }
    }

    /// Position of `phase` in this model, if it belongs to it.
    pub fn index_of(self, phase: Phase) -> Option<usize> {
        self.phases().iter().position(|p| *p == phase)
    }
}

// ---------------------------------------------------------------------------
// TurnSignals
// ---------------------------------------------------------------------------

/// What the tracker needs to know about one learner turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSignals {
    normalized: String,
    interaction_type: Option<InteractionType>,
}

impl TurnSignals {
    pub fn new(utterance: &str, interaction_type: Option<InteractionType>) -> Self {
        Self {
            normalized: utterance.to_lowercase(),
            interaction_type,
        }
    }

    fn signals_readiness_for(&self, target: Phase) -> bool {
        // Asking for a review of finished work is itself a reflection cue.
        if target == Phase::Reflection
            && self.interaction_type == Some(InteractionType::FeedbackRequest)
        {
            return true;
        }
        target
            .readiness_phrases()
            .iter()
            .any(|phrase| self.normalized.contains(phrase))
    }
}

// ---------------------------------------------------------------------------
// PhaseTracker
// ---------------------------------------------------------------------------

/// A recorded forward move between two phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    /// Learner turn (1-based) on which the transition happened.
    pub at_turn: u32,
}

/// Tracks the current phase, the turns spent in it, and transition history.
///
/// Lives inside the session and is persisted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTracker {
    model: PhaseModel,
    current: Phase,
    min_turns: u32,
    turns_in_phase: u32,
    learner_turns: u32,
    #[serde(default)]
    transitions: Vec<PhaseTransition>,
}

impl PhaseTracker {
    /// Starts in the first phase of `model`.
    pub fn new(model: PhaseModel, min_turns: u32) -> Self {
        Self {
            model,
            current: model.phases()[0],
            min_turns: min_turns.max(1),
            turns_in_phase: 0,
            learner_turns: 0,
            transitions: Vec::new(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current
    }

    pub fn model(&self) -> PhaseModel {
        self.model
    }

    pub fn turns_in_phase(&self) -> u32 {
        self.turns_in_phase
    }

    /// Learner turns observed since the session started.
    pub fn learner_turns(&self) -> u32 {
        self.learner_turns
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    fn index(&self) -> usize {
        self.model.index_of(self.current).unwrap_or(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.index() + 1 == self.model.phases().len()
    }

    /// Overall progress through the model in `[0, 1]`.
    pub fn progress_fraction(&self) -> f32 {
        let count = self.model.phases().len() as f32;
        let ratio = (self.turns_in_phase as f32 / self.min_turns as f32).min(1.0);
        if self.is_terminal() && ratio >= 1.0 {
            return 1.0;
        }
        (self.index() as f32 + ratio * 0.9) / count
    }

    /// Records one learner turn and advances a single phase when ready.
    ///
    /// Returns the transition if one happened.
    pub fn advance_if_ready(&mut self, signals: &TurnSignals) -> Option<PhaseTransition> {
        self.learner_turns += 1;
        self.turns_in_phase += 1;

        if self.is_terminal() || self.turns_in_phase < self.min_turns {
            return None;
        }

        let next = self.model.phases()[self.index() + 1];
        if !signals.signals_readiness_for(next) {
            return None;
        }

        let transition = PhaseTransition {
            from: self.current,
            to: next,
            at_turn: self.learner_turns,
        };
        tracing::info!(
            target: "mentor::phase",
            from = %transition.from,
            to = %transition.to,
            turn = transition.at_turn,
            "Phase advanced"
        );
        self.current = next;
        self.turns_in_phase = 0;
        self.transitions.push(transition.clone());
        Some(transition)
    }

    /// Checks internal consistency after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        let Some(index) = self.model.index_of(self.current) else {
            return Err(format!(
                "phase '{}' does not belong to the {} model",
                self.current, self.model
            ));
        };
        if self.min_turns == 0 {
            return Err("phase min_turns is zero".to_string());
        }
        if self.turns_in_phase > self.learner_turns {
            return Err("more turns in phase than learner turns".to_string());
        }
        let mut last = 0usize;
        for transition in &self.transitions {
            let from = self.model.index_of(transition.from);
            let to = self.model.index_of(transition.to);
            match (from, to) {
                (Some(f), Some(t)) if t == f + 1 && t > last => last = t,
                _ => return Err("phase transitions are not monotonic".to_string()),
            }
        }
        if last != index {
            return Err("phase transitions do not lead to the current phase".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> TurnSignals {
        TurnSignals::new(text, None)
    }

    #[test]
    fn test_starts_in_first_phase() {
        let tracker = PhaseTracker::new(PhaseModel::FivePhase, 3);
        assert_eq!(tracker.current_phase(), Phase::Discovery);
        assert_eq!(tracker.progress_fraction(), 0.0);

        let three = PhaseTracker::new(PhaseModel::ThreePhase, 2);
        assert_eq!(three.current_phase(), Phase::Ideation);
    }

    #[test]
    fn test_requires_min_turns_before_advancing() {
        let mut tracker = PhaseTracker::new(PhaseModel::FivePhase, 3);
        assert!(tracker.advance_if_ready(&plain("what if the roof folds")).is_none());
        assert!(tracker.advance_if_ready(&plain("what if it opens")).is_none());
        let transition = tracker
            .advance_if_ready(&plain("what if we compare options"))
            .expect("third turn with readiness should advance");
        assert_eq!(transition.from, Phase::Discovery);
        assert_eq!(transition.to, Phase::Exploration);
        assert_eq!(transition.at_turn, 3);
        assert_eq!(tracker.turns_in_phase(), 0);
    }

    #[test]
    fn test_requires_readiness_signal() {
        let mut tracker = PhaseTracker::new(PhaseModel::FivePhase, 1);
        for _ in 0..5 {
            assert!(tracker.advance_if_ready(&plain("tell me more")).is_none());
        }
        assert_eq!(tracker.current_phase(), Phase::Discovery);
    }

    #[test]
    fn test_advances_one_phase_at_a_time() {
        let mut tracker = PhaseTracker::new(PhaseModel::FivePhase, 1);
        // Synthesis language while still in discovery does not skip exploration.
        assert!(tracker.advance_if_ready(&plain("let me combine everything")).is_none());
        assert!(tracker.advance_if_ready(&plain("explore an alternative")).is_some());
        assert_eq!(tracker.current_phase(), Phase::Exploration);
    }

    #[test]
    fn test_terminal_phase_persists() {
        let mut tracker = PhaseTracker::new(PhaseModel::ThreePhase, 1);
        tracker.advance_if_ready(&plain("let me sketch it"));
        tracker.advance_if_ready(&plain("which material should I use"));
        assert_eq!(tracker.current_phase(), Phase::Materialization);
        assert!(tracker.is_terminal());
        for _ in 0..3 {
            assert!(tracker.advance_if_ready(&plain("sketch the material detail")).is_none());
        }
        assert_eq!(tracker.current_phase(), Phase::Materialization);
        assert_eq!(tracker.progress_fraction(), 1.0);
        assert!(tracker.validate().is_ok());
    }

    #[test]
    fn test_feedback_request_signals_reflection() {
        let signals = TurnSignals::new("how is it?", Some(InteractionType::FeedbackRequest));
        assert!(signals.signals_readiness_for(Phase::Reflection));
        assert!(!signals.signals_readiness_for(Phase::Synthesis));
    }

    #[test]
    fn test_progress_grows_monotonically() {
        let mut tracker = PhaseTracker::new(PhaseModel::FivePhase, 2);
        let mut last = tracker.progress_fraction();
        for text in ["hello", "what if", "ok", "combine it", "detail"] {
            tracker.advance_if_ready(&plain(text));
            let now = tracker.progress_fraction();
            assert!(now >= last, "{now} < {last}");
            last = now;
        }
    }

    #[test]
    fn test_validate_rejects_foreign_phase() {
        let mut tracker = PhaseTracker::new(PhaseModel::ThreePhase, 2);
        tracker.current = Phase::Reflection;
        assert!(tracker.validate().is_err());
    }
}
