//! Routing Decision Engine.
//!
//! Maps a [`Classification`], the current [`Phase`] and a small
//! [`RoutingContext`] onto exactly one [`Route`] through an ordered rule
//! table. The first matching rule wins; the order of [`rules::RULES`] is part
//! of the contract and tests assert on `rule_applied`.

mod engine;
pub mod rules;

pub use engine::RoutingEngine;
pub use rules::{DEFAULT_RULE_ID, Rule};

use crate::classification::heuristic::normalize;
use crate::session::{Session, SkillLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The high-level response strategy selected for a turn.
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
pub enum Route {
    ProgressiveOpening,
    KnowledgeOnly,
    ExampleRequest,
    SocraticClarification,
    SocraticExploration,
    SupportiveScaffolding,
    FoundationalBuilding,
    BalancedGuidance,
    CognitiveChallenge,
    CognitiveIntervention,
    KnowledgeWithChallenge,
    MultiAgentComprehensive,
}

impl Route {
    /// Routes whose reply is built around a gamified challenge.
    pub fn is_challenge(self) -> bool {
        matches!(self, Route::CognitiveChallenge | Route::CognitiveIntervention)
    }

    /// Routes that only a strong explicit request may turn into a challenge.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Route::SocraticClarification | Route::KnowledgeOnly | Route::ExampleRequest
        )
    }
}

/// Per-turn facts the rules need besides the classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingContext {
    /// Normalized (lowercased, whitespace-collapsed) utterance.
    pub utterance: String,
    /// Learner turns that came before the current one.
    pub prior_learner_turns: u32,
    pub skill_level: SkillLevel,
    /// Routes of the most recent tutor turns, oldest first.
    pub recent_routes: Vec<Route>,
}

impl RoutingContext {
    pub fn new(utterance: &str, prior_learner_turns: u32, skill_level: SkillLevel) -> Self {
        Self {
            utterance: normalize(utterance),
            prior_learner_turns,
            skill_level,
            recent_routes: Vec::new(),
        }
    }

    pub fn with_recent_routes(mut self, routes: Vec<Route>) -> Self {
        self.recent_routes = routes;
        self
    }

    /// Builds the context for `utterance` from session state.
    ///
    /// If the session already ends with the current learner turn, that turn is
    /// not counted as prior history.
    pub fn from_session(session: &Session, utterance: &str, route_window: usize) -> Self {
        let mut prior = session.learner_turn_count();
        if session.turns.last().is_some_and(|t| t.is_learner()) {
            prior = prior.saturating_sub(1);
        }
        Self::new(utterance, prior, session.skill_level)
            .with_recent_routes(session.recent_routes(route_window))
    }

    pub fn is_first_turn(&self) -> bool {
        self.prior_learner_turns == 0
    }
}

/// The outcome of routing one turn.
///
/// `rule_applied` always names an entry of the static rule table, or
/// [`DEFAULT_RULE_ID`] when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub route: Route,
    pub user_intent: String,
    pub rule_applied: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl RoutingDecision {
    pub fn new(
        route: Route,
        user_intent: impl Into<String>,
        rule_applied: impl Into<String>,
    ) -> Self {
        Self {
            route,
            user_intent: user_intent.into(),
            rule_applied: rule_applied.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn meta(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn meta_bool(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseModel;

    #[test]
    fn test_route_names_are_snake_case() {
        assert_eq!(Route::KnowledgeWithChallenge.to_string(), "knowledge_with_challenge");
        assert_eq!(
            "multi_agent_comprehensive".parse::<Route>().unwrap(),
            Route::MultiAgentComprehensive
        );
    }

    #[test]
    fn test_context_excludes_current_turn() {
        let mut session = Session::new("s", SkillLevel::Advanced, PhaseModel::FivePhase, 3);
        let ctx = RoutingContext::from_session(&session, "Hello", 3);
        assert!(ctx.is_first_turn());

        session.push_learner("Hello", None);
        let ctx = RoutingContext::from_session(&session, "Hello", 3);
        assert!(ctx.is_first_turn());
        assert_eq!(ctx.utterance, "hello");

        session.push_tutor("Welcome", Route::ProgressiveOpening, None);
        session.push_learner("Next", None);
        let ctx = RoutingContext::from_session(&session, "Next", 3);
        assert_eq!(ctx.prior_learner_turns, 1);
        assert_eq!(ctx.recent_routes, vec![Route::ProgressiveOpening]);
    }

    #[test]
    fn test_metadata_accessors() {
        let mut d =
            RoutingDecision::new(Route::KnowledgeOnly, "knowledge_seeking", "pure_knowledge");
        d.set_meta("is_pure_knowledge_request", true);
        d.set_meta("phase", "discovery");
        assert!(d.meta_bool("is_pure_knowledge_request"));
        assert_eq!(d.meta_str("phase"), Some("discovery"));
        assert!(!d.meta_bool("missing"));
    }
}
