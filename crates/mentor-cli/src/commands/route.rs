//! `mentor route`: offline routing dry run.

use anyhow::Result;
use mentor_core::challenge::{ChallengeController, Escalation};
use mentor_core::classification::{Classification, heuristic};
use mentor_core::config::MentorConfig;
use mentor_core::phase::TurnSignals;
use mentor_core::routing::{RoutingContext, RoutingEngine};
use mentor_core::session::{Session, SkillLevel};
use serde_json::json;

/// Replays `history` through heuristic classification, routing and challenge
/// escalation on a scratch session, then prints the decision for `utterance`.
pub fn run(config: &MentorConfig, utterance: &str, history: &[String]) -> Result<()> {
    let engine = RoutingEngine::new();
    let controller = ChallengeController::new(config.challenge.clone());
    let mut session = Session::new(
        "dry-run",
        SkillLevel::default(),
        config.phase.model,
        config.phase.min_turns_per_phase,
    );

    for earlier in history {
        route_turn(config, &engine, &controller, &mut session, earlier);
    }
    let (classification, escalation) = route_turn(config, &engine, &controller, &mut session, utterance);

    let output = json!({
        "utterance": utterance,
        "phase": session.phase.current_phase(),
        "classification": classification,
        "decision": escalation.decision,
        "challenge": escalation.payload(),
        "rules": engine.rule_ids(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn route_turn(
    config: &MentorConfig,
    engine: &RoutingEngine,
    controller: &ChallengeController,
    session: &mut Session,
    utterance: &str,
) -> (Classification, Escalation) {
    let classification = heuristic::classify(utterance, &session.turns);
    session.push_learner(utterance, None);
    session
        .phase
        .advance_if_ready(&TurnSignals::new(utterance, Some(classification.interaction_type)));

    let ctx = RoutingContext::from_session(session, utterance, config.challenge.stagnation_window);
    let decision = engine.decide(&classification, session.phase.current_phase(), &ctx);
    let escalation = controller.maybe_escalate(decision, &classification, session);
    session.push_tutor(
        format!("({} reply)", escalation.decision.route),
        escalation.decision.route,
        escalation.fired_family(),
    );
    (classification, escalation)
}
