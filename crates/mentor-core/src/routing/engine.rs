use super::rules::{self, DEFAULT_RULE_ID, RULES, Rule};
use super::{Route, RoutingContext, RoutingDecision};
use crate::classification::Classification;
use crate::phase::Phase;

/// Evaluates the rule table top to bottom.
///
/// The engine holds no state; the same inputs always produce the same decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingEngine;

impl RoutingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Picks the route for a turn. First matching rule wins.
    pub fn decide(
        &self,
        classification: &Classification,
        phase: Phase,
        ctx: &RoutingContext,
    ) -> RoutingDecision {
        self.evaluate(RULES, classification, phase, ctx)
    }

    /// Re-evaluates only the rules strictly below `rule_id`.
    ///
    /// Used when the decision produced by `rule_id` was vetoed, so the turn
    /// falls back to the next-highest-priority match. An unknown id evaluates
    /// the whole table.
    pub fn decide_after(
        &self,
        rule_id: &str,
        classification: &Classification,
        phase: Phase,
        ctx: &RoutingContext,
    ) -> RoutingDecision {
        let start = rules::position(rule_id).map(|i| i + 1).unwrap_or(0);
        let mut decision = self.evaluate(&RULES[start..], classification, phase, ctx);
        decision.set_meta("fallback_from", rule_id);
        decision
    }

    /// Every identifier `rule_applied` can take, in priority order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        RULES
            .iter()
            .map(|rule| rule.id)
            .chain(std::iter::once(DEFAULT_RULE_ID))
            .collect()
    }

    pub fn is_known_rule(&self, id: &str) -> bool {
        id == DEFAULT_RULE_ID || rules::find(id).is_some()
    }

    pub fn rule(&self, id: &str) -> Option<&'static Rule> {
        rules::find(id)
    }

    fn evaluate(
        &self,
        table: &'static [Rule],
        classification: &Classification,
        phase: Phase,
        ctx: &RoutingContext,
    ) -> RoutingDecision {
        let mut decision = match table
            .iter()
            .find(|rule| rule.matches(classification, phase, ctx))
        {
            Some(rule) => {
                let intent = rule
                    .intent
                    .map(str::to_string)
                    .unwrap_or_else(|| classification.interaction_type.to_string());
                RoutingDecision::new(rule.route, intent, rule.id)
            }
            None => {
                tracing::debug!(
                    target: "mentor::routing",
                    interaction_type = %classification.interaction_type,
                    "No routing rule matched, using default route"
                );
                RoutingDecision::new(
                    Route::BalancedGuidance,
                    classification.interaction_type.to_string(),
                    DEFAULT_RULE_ID,
                )
            }
        };

        decision.set_meta(
            "is_pure_knowledge_request",
            classification.is_pure_knowledge_request,
        );
        decision.set_meta("interaction_type", classification.interaction_type.to_string());
        decision.set_meta("classification_source", classification.source.to_string());
        decision.set_meta("confidence_score", f64::from(classification.confidence_score));
        decision.set_meta("phase", phase.to_string());

        tracing::info!(
            target: "mentor::routing",
            route = %decision.route,
            rule = %decision.rule_applied,
            intent = %decision.user_intent,
            "Route selected"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::heuristic::classify;
    use crate::classification::{ConfidenceLevel, InteractionType, Level};
    use crate::session::SkillLevel;

    fn ctx(text: &str, prior: u32) -> RoutingContext {
        RoutingContext::new(text, prior, SkillLevel::Intermediate)
    }

    fn decide(text: &str, prior: u32) -> RoutingDecision {
        let c = classify(text, &[]);
        RoutingEngine::new().decide(&c, Phase::Discovery, &ctx(text, prior))
    }

    #[test]
    fn test_pure_knowledge_first_turn() {
        let d = decide("What are the best practices for circulation design?", 0);
        assert_eq!(d.route, Route::KnowledgeOnly);
        assert_eq!(d.rule_applied, "pure_knowledge");
        assert!(d.meta_bool("is_pure_knowledge_request"));
    }

    #[test]
    fn test_first_message_opening() {
        let d = decide("Hi, I'm starting a riverside pavilion", 0);
        assert_eq!(d.route, Route::ProgressiveOpening);
        assert_eq!(d.rule_applied, "first_message");
    }

    #[test]
    fn test_overconfidence_routes_to_challenge() {
        let d = decide("This design is perfect and will work for everyone", 1);
        assert_eq!(d.route, Route::CognitiveChallenge);
        assert_eq!(d.rule_applied, "overconfidence");
    }

    #[test]
    fn test_decide_after_skips_vetoed_rule() {
        let text = "This design is perfect and will work for everyone";
        let c = classify(text, &[]);
        let d = RoutingEngine::new().decide_after(
            "overconfidence",
            &c,
            Phase::Discovery,
            &ctx(text, 1),
        );
        assert_eq!(d.rule_applied, "confident_assertion");
        assert_eq!(d.route, Route::SocraticExploration);
        assert_eq!(d.meta_str("fallback_from"), Some("overconfidence"));
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let mut c = Classification::new(InteractionType::Other);
        c.confidence_level = ConfidenceLevel::Neutral;
        c.understanding_level = Level::Medium;
        let d = RoutingEngine::new().decide(&c, Phase::Synthesis, &ctx("hmm right then", 4));
        assert_eq!(d.route, Route::BalancedGuidance);
        assert_eq!(d.rule_applied, DEFAULT_RULE_ID);
    }

    #[test]
    fn test_beginner_technical_question_gets_foundations() {
        let mut c = Classification::new(InteractionType::DesignGuidance);
        c.is_technical_question = true;
        let beginner =
            RoutingContext::new("how do stairs meet egress code?", 2, SkillLevel::Beginner);
        let d = RoutingEngine::new().decide(&c, Phase::Exploration, &beginner);
        assert_eq!(d.route, Route::FoundationalBuilding);
    }

    #[test]
    fn test_rule_ids_end_with_default() {
        let ids = RoutingEngine::new().rule_ids();
        assert_eq!(ids.first(), Some(&"confusion"));
        assert_eq!(ids.last(), Some(&DEFAULT_RULE_ID));
        assert!(ids.iter().all(|id| RoutingEngine::new().is_known_rule(id)));
        assert!(!RoutingEngine::new().is_known_rule("made_up"));
    }
}
