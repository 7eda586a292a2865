//! Invariants of the routing table, checked over every classification shape.

use mentor_core::classification::heuristic::classify;
use mentor_core::classification::{Classification, ConfidenceLevel, InteractionType, Level};
use mentor_core::phase::Phase;
use mentor_core::routing::{Route, RoutingContext, RoutingEngine};
use mentor_core::session::{SkillLevel, Turn};
use strum::IntoEnumIterator;

const PHASES: &[Phase] = &[
    Phase::Discovery,
    Phase::Exploration,
    Phase::Synthesis,
    Phase::Application,
    Phase::Reflection,
    Phase::Ideation,
    Phase::Visualization,
    Phase::Materialization,
];

const CONFIDENCE: &[ConfidenceLevel] = &[
    ConfidenceLevel::Uncertain,
    ConfidenceLevel::Neutral,
    ConfidenceLevel::Confident,
    ConfidenceLevel::Overconfident,
];

const SKILLS: &[SkillLevel] = &[
    SkillLevel::Beginner,
    SkillLevel::Intermediate,
    SkillLevel::Advanced,
];

/// Every combination of interaction type, flags and confidence level.
fn all_classifications() -> Vec<Classification> {
    let mut out = Vec::new();
    for interaction_type in InteractionType::iter() {
        for flags in 0u8..32 {
            for confidence in CONFIDENCE {
                let mut c = Classification::new(interaction_type);
                c.is_technical_question = flags & 1 != 0;
                c.is_example_request = flags & 2 != 0;
                c.is_pure_knowledge_request = flags & 4 != 0;
                c.shows_confusion = flags & 8 != 0;
                c.shows_negative_context = flags & 16 != 0;
                c.confidence_level = *confidence;
                c.understanding_level = if flags % 3 == 0 { Level::Low } else { Level::Medium };
                out.push(c);
            }
        }
    }
    out
}

#[test]
fn confusion_always_routes_to_clarification() {
    let engine = RoutingEngine::new();
    for mut c in all_classifications() {
        c.interaction_type = InteractionType::ConfusionExpression;
        for phase in PHASES {
            for skill in SKILLS {
                for prior in [0, 1, 7] {
                    let ctx = RoutingContext::new("challenge me, I'm lost", prior, *skill);
                    let d = engine.decide(&c, *phase, &ctx);
                    assert_eq!(d.route, Route::SocraticClarification, "{c:?}");
                    assert_eq!(d.rule_applied, "confusion");
                }
            }
        }
    }
}

#[test]
fn rule_applied_always_names_a_known_rule() {
    let engine = RoutingEngine::new();
    for c in all_classifications() {
        for phase in PHASES {
            for prior in [0, 3] {
                let ctx = RoutingContext::new("anything at all", prior, SkillLevel::Beginner);
                let d = engine.decide(&c, *phase, &ctx);
                assert!(engine.is_known_rule(&d.rule_applied), "{}", d.rule_applied);
                assert!(engine.rule_ids().iter().any(|id| *id == d.rule_applied));
            }
        }
    }
}

#[test]
fn negative_context_never_selects_example_route() {
    let engine = RoutingEngine::new();
    for mut c in all_classifications() {
        c.is_example_request = true;
        c.shows_negative_context = true;
        for phase in PHASES {
            let ctx = RoutingContext::new("I don't want examples", 2, SkillLevel::Intermediate);
            let d = engine.decide(&c, *phase, &ctx);
            assert_ne!(d.route, Route::ExampleRequest, "{c:?}");
        }
    }
}

#[test]
fn negative_context_utterance_end_to_end() {
    let history = vec![Turn::learner("I'm working on a library"), Turn::tutor("Great", None, None)];
    let text = "I don't want examples, just help me figure out my entrance";
    let c = classify(text, &history);
    assert!(c.shows_negative_context);
    let ctx = RoutingContext::new(text, 1, SkillLevel::Intermediate);
    let d = RoutingEngine::new().decide(&c, Phase::Discovery, &ctx);
    assert_ne!(d.route, Route::ExampleRequest);
}

#[test]
fn earlier_rule_wins_ties() {
    // Pure knowledge sits above every later rule that also matches.
    let mut c = Classification::new(InteractionType::KnowledgeSeeking);
    c.is_pure_knowledge_request = true;
    let ctx = RoutingContext::new("what is a courtyard house", 3, SkillLevel::Advanced);
    let d = RoutingEngine::new().decide(&c, Phase::Exploration, &ctx);
    assert_eq!(d.rule_applied, "pure_knowledge");

    // First message and overconfidence: the opening wins on the first turn.
    let c = Classification {
        confidence_level: ConfidenceLevel::Overconfident,
        ..Classification::new(InteractionType::OverconfidentStatement)
    };
    let first = RoutingContext::new("my design is perfect", 0, SkillLevel::Advanced);
    let d = RoutingEngine::new().decide(&c, Phase::Discovery, &first);
    assert_eq!(d.route, Route::ProgressiveOpening);
    let later = RoutingContext::new("my design is perfect", 1, SkillLevel::Advanced);
    let d = RoutingEngine::new().decide(&c, Phase::Discovery, &later);
    assert_eq!(d.route, Route::CognitiveChallenge);
}

#[test]
fn heuristic_classification_is_pure() {
    let history = vec![
        Turn::learner("I'm designing a school on a sloped site"),
        Turn::tutor("What drives the section?", None, None),
    ];
    for text in [
        "What are the best practices for circulation design?",
        "ok",
        "This design is perfect and will work for everyone",
        "Can you show me examples of courtyard schools?",
        "I don't get how the levels connect",
        "",
    ] {
        assert_eq!(classify(text, &history), classify(text, &history), "{text}");
    }
}
