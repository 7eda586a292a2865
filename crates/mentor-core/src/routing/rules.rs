//! The static, ordered routing rule table.

use super::{Route, RoutingContext};
use crate::challenge::ChallengeTrigger;
use crate::classification::{Classification, ConfidenceLevel, InteractionType, Level};
use crate::phase::Phase;
use crate::session::SkillLevel;

/// Identifier reported when no rule matched.
pub const DEFAULT_RULE_ID: &str = "default";

type Predicate = fn(&Classification, Phase, &RoutingContext) -> bool;

/// One row of the rule table.
pub struct Rule {
    pub id: &'static str,
    pub route: Route,
    /// Intent reported in the decision. `None` reports the interaction type.
    pub intent: Option<&'static str>,
    /// Challenge trigger this rule raises, which makes the decision challenge-eligible.
    pub trigger: Option<ChallengeTrigger>,
    predicate: Predicate,
}

impl Rule {
    pub fn matches(&self, c: &Classification, phase: Phase, ctx: &RoutingContext) -> bool {
        (self.predicate)(c, phase, ctx)
    }

    pub fn is_challenge_eligible(&self) -> bool {
        self.trigger.is_some()
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("route", &self.route)
            .field("trigger", &self.trigger)
            .finish()
    }
}

const COMPREHENSIVE: &[&str] = &[
    "comprehensive",
    "full review",
    "complete review",
    "all aspects",
    "overall analysis",
    "complete analysis",
    "everything about",
    "in depth",
    "in-depth",
    "holistic",
];

fn confusion(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.is_confused()
}

fn pure_knowledge(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.is_pure_knowledge_request && !c.wants_examples()
}

fn example_request(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.wants_examples()
}

fn first_message(c: &Classification, _: Phase, ctx: &RoutingContext) -> bool {
    ctx.is_first_turn() || c.interaction_type == InteractionType::FirstMessage
}

fn overconfidence(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::OverconfidentStatement
        || c.confidence_level == ConfidenceLevel::Overconfident
}

fn low_engagement(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::LowEngagement
}

fn feedback_request(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::FeedbackRequest
}

fn comprehensive_request(_: &Classification, _: Phase, ctx: &RoutingContext) -> bool {
    COMPREHENSIVE.iter().any(|p| ctx.utterance.contains(p))
}

fn confident_assertion(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    matches!(
        c.confidence_level,
        ConfidenceLevel::Confident | ConfidenceLevel::Overconfident
    )
}

fn beginner_foundations(c: &Classification, _: Phase, ctx: &RoutingContext) -> bool {
    ctx.skill_level == SkillLevel::Beginner
        && (c.understanding_level == Level::Low || c.is_technical_question)
}

fn uncertain_learner(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.confidence_level == ConfidenceLevel::Uncertain
}

fn knowledge_in_context(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::KnowledgeSeeking || c.is_technical_question
}

fn design_exploration(c: &Classification, phase: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::DesignExploration
        || (c.interaction_type == InteractionType::Other
            && matches!(phase, Phase::Exploration | Phase::Ideation))
}

fn design_guidance(c: &Classification, _: Phase, _: &RoutingContext) -> bool {
    c.interaction_type == InteractionType::DesignGuidance
}

/// Rules in priority order, highest first.
pub static RULES: &[Rule] = &[
    Rule {
        id: "confusion",
        route: Route::SocraticClarification,
        intent: Some("confusion_expression"),
        trigger: None,
        predicate: confusion,
    },
    Rule {
        id: "pure_knowledge",
        route: Route::KnowledgeOnly,
        intent: Some("knowledge_seeking"),
        trigger: None,
        predicate: pure_knowledge,
    },
    Rule {
        id: "example_request",
        route: Route::ExampleRequest,
        intent: Some("example_request"),
        trigger: None,
        predicate: example_request,
    },
    Rule {
        id: "first_message",
        route: Route::ProgressiveOpening,
        intent: Some("first_message"),
        trigger: None,
        predicate: first_message,
    },
    Rule {
        id: "overconfidence",
        route: Route::CognitiveChallenge,
        intent: Some("overconfident_statement"),
        trigger: Some(ChallengeTrigger::Overconfidence),
        predicate: overconfidence,
    },
    Rule {
        id: "low_engagement",
        route: Route::CognitiveIntervention,
        intent: Some("low_engagement"),
        trigger: Some(ChallengeTrigger::LowEngagement),
        predicate: low_engagement,
    },
    Rule {
        id: "feedback_request",
        route: Route::MultiAgentComprehensive,
        intent: Some("feedback_request"),
        trigger: None,
        predicate: feedback_request,
    },
    Rule {
        id: "comprehensive_request",
        route: Route::MultiAgentComprehensive,
        intent: Some("comprehensive_request"),
        trigger: None,
        predicate: comprehensive_request,
    },
    Rule {
        id: "confident_assertion",
        route: Route::SocraticExploration,
        intent: None,
        trigger: None,
        predicate: confident_assertion,
    },
    Rule {
        id: "beginner_foundations",
        route: Route::FoundationalBuilding,
        intent: None,
        trigger: None,
        predicate: beginner_foundations,
    },
    Rule {
        id: "uncertain_learner",
        route: Route::SupportiveScaffolding,
        intent: None,
        trigger: None,
        predicate: uncertain_learner,
    },
    Rule {
        id: "knowledge_in_context",
        route: Route::KnowledgeWithChallenge,
        intent: Some("knowledge_seeking"),
        trigger: None,
        predicate: knowledge_in_context,
    },
    Rule {
        id: "design_exploration",
        route: Route::SocraticExploration,
        intent: Some("design_exploration"),
        trigger: None,
        predicate: design_exploration,
    },
    Rule {
        id: "design_guidance",
        route: Route::BalancedGuidance,
        intent: Some("design_guidance"),
        trigger: None,
        predicate: design_guidance,
    },
];

/// Looks a rule up by id.
pub fn find(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.id == id)
}

/// Position of a rule in the table.
pub fn position(id: &str) -> Option<usize> {
    RULES.iter().position(|rule| rule.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique() {
        let ids: HashSet<_> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RULES.len());
        assert!(!ids.contains(DEFAULT_RULE_ID));
    }

    #[test]
    fn test_only_overconfidence_and_low_engagement_are_eligible() {
        let eligible: Vec<_> = RULES
            .iter()
            .filter(|r| r.is_challenge_eligible())
            .map(|r| r.id)
            .collect();
        assert_eq!(eligible, vec!["overconfidence", "low_engagement"]);
    }

    #[test]
    fn test_priority_order_is_stable() {
        assert!(position("confusion") < position("pure_knowledge"));
        assert!(position("pure_knowledge") < position("example_request"));
        assert!(position("example_request") < position("first_message"));
        assert!(position("first_message") < position("overconfidence"));
        assert!(position("overconfidence") < position("feedback_request"));
        assert!(position("feedback_request") < position("design_guidance"));
    }
}
