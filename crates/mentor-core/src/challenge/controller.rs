use super::catalog::{self, ChallengePayload};
use super::{ChallengeFamily, ChallengeTrigger, SuppressionReason};
use crate::classification::Classification;
use crate::classification::heuristic::normalize;
use crate::config::ChallengeConfig;
use crate::context::{DomainContext, context_hash};
use crate::routing::{Route, RoutingContext, RoutingDecision, RoutingEngine, rules};
use crate::session::Session;

/// Phrases that override every cooldown.
const STRONG_EXPLICIT: &[&str] = &[
    "role play",
    "role-play",
    "roleplay",
    "pretend",
    "challenge me",
    "give me a challenge",
    "from the perspective of",
    "quiz me",
    "test me",
];

const PERSPECTIVE_SEEKING: &[&str] = &[
    "perspective",
    "point of view",
    "through the eyes",
    "how would a",
    "how might a",
    "how would someone",
];

const CREATIVE_BLOCK: &[&str] = &[
    "i'm stuck",
    "i am stuck",
    "stuck on",
    "can't think",
    "cannot think",
    "no ideas",
    "out of ideas",
    "creative block",
    "blank page",
];

const CURIOSITY: &[&str] = &["i wonder", "curious", "what would happen if", "i'd love to know"];

/// What the controller did with a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationOutcome {
    /// No trigger applied, or the route may not be escalated.
    NotEligible,
    Fired(ChallengePayload),
    Suppressed {
        family: ChallengeFamily,
        trigger: ChallengeTrigger,
        reason: SuppressionReason,
    },
}

/// The (possibly rewritten) routing decision plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    pub decision: RoutingDecision,
    pub outcome: EscalationOutcome,
}

impl Escalation {
    pub fn payload(&self) -> Option<&ChallengePayload> {
        match &self.outcome {
            EscalationOutcome::Fired(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn fired_family(&self) -> Option<ChallengeFamily> {
        self.payload().map(|p| p.family)
    }
}

/// Decides whether a turn escalates into a challenge.
///
/// This is the only place that reads or writes the cooldown ledger.
#[derive(Debug, Clone)]
pub struct ChallengeController {
    config: ChallengeConfig,
    engine: RoutingEngine,
}

impl ChallengeController {
    pub fn new(config: ChallengeConfig) -> Self {
        Self {
            config,
            engine: RoutingEngine::new(),
        }
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// Considers escalating `decision` for the session's current learner turn.
    ///
    /// The session must already contain the current learner turn and its
    /// phase update. On a fire the ledger is updated and the route becomes a
    /// challenge route. When the escalation of a challenge-eligible rule is
    /// suppressed, the rules after it are re-evaluated so the turn gets the
    /// next-highest-priority route.
    pub fn maybe_escalate(
        &self,
        decision: RoutingDecision,
        classification: &Classification,
        session: &mut Session,
    ) -> Escalation {
        if decision.route == Route::SocraticClarification {
            return not_eligible(decision);
        }

        let text = normalize(session.last_learner_text().unwrap_or_default());
        let turn = session.learner_turn_count();
        let strong = STRONG_EXPLICIT.iter().any(|p| text.contains(p));
        let rule_trigger = rules::find(&decision.rule_applied).and_then(|rule| rule.trigger);

        let Some(trigger) = self.select_trigger(strong, rule_trigger, &text, session, turn) else {
            return not_eligible(decision);
        };

        if decision.route.is_protected() && !strong {
            return not_eligible(decision);
        }

        let family = ChallengeFamily::detect(&text).unwrap_or_else(|| trigger.default_family());
        let window = self.config.context_window_turns * 2;
        let history = session.history_window(window + 1);
        let recent = &history[..history.len().saturating_sub(1)];
        let domain = DomainContext::detect(&text, recent);
        let phase = session.phase.current_phase();
        let hash = context_hash(&domain, phase);

        if !strong {
            if let Some(reason) =
                session
                    .cooldowns
                    .check(family, &hash, turn, self.config.cooldown_window_turns)
            {
                tracing::info!(
                    target: "mentor::challenge",
                    family = %family,
                    trigger = %trigger,
                    reason = %reason,
                    turn,
                    "Challenge suppressed by cooldown"
                );
                let mut decision = if rule_trigger.is_some() {
                    self.fall_back(&decision, classification, session)
                } else {
                    decision
                };
                decision.set_meta("challenge_suppressed", true);
                decision.set_meta("suppression_reason", reason.to_string());
                decision.set_meta("suppressed_family", family.to_string());
                decision.set_meta("context_hash", hash);
                return Escalation {
                    decision,
                    outcome: EscalationOutcome::Suppressed {
                        family,
                        trigger,
                        reason,
                    },
                };
            }
        }

        session.cooldowns.record_fire(family, &hash, turn);
        let payload = catalog::build(family, trigger, &domain, phase);

        let mut decision = decision;
        let from = decision.route;
        decision.route = escalated_route(from);
        if decision.route != from {
            decision.set_meta("escalated_from", from.to_string());
        }
        decision.set_meta("challenge_family", family.to_string());
        decision.set_meta("challenge_trigger", trigger.to_string());
        decision.set_meta("context_hash", hash);
        if strong {
            decision.set_meta("cooldown_overridden", true);
        }

        tracing::info!(
            target: "mentor::challenge",
            family = %family,
            trigger = %trigger,
            route = %decision.route,
            turn,
            "Challenge fired"
        );

        Escalation {
            decision,
            outcome: EscalationOutcome::Fired(payload),
        }
    }

    fn select_trigger(
        &self,
        strong: bool,
        rule_trigger: Option<ChallengeTrigger>,
        text: &str,
        session: &Session,
        turn: u32,
    ) -> Option<ChallengeTrigger> {
        if strong {
            return Some(ChallengeTrigger::ExplicitRequest);
        }
        if rule_trigger.is_some() {
            return rule_trigger;
        }
        if PERSPECTIVE_SEEKING.iter().any(|p| text.contains(p)) {
            return Some(ChallengeTrigger::PerspectiveSeeking);
        }
        if CREATIVE_BLOCK.iter().any(|p| text.contains(p)) {
            return Some(ChallengeTrigger::CreativeBlock);
        }
        if CURIOSITY.iter().any(|p| text.contains(p)) {
            return Some(ChallengeTrigger::Curiosity);
        }
        if self.is_stagnating(session) {
            return Some(ChallengeTrigger::Stagnation);
        }
        let every = self.config.engagement_boost_every;
        if every > 0 && turn > 0 && turn % every == 0 {
            return Some(ChallengeTrigger::EngagementBoost);
        }
        None
    }

    /// The same non-challenge route was chosen for each of the last N tutor turns.
    fn is_stagnating(&self, session: &Session) -> bool {
        let n = self.config.stagnation_window;
        if n == 0 {
            return false;
        }
        let routes = session.recent_routes(n);
        routes.len() == n
            && routes.windows(2).all(|w| w[0] == w[1])
            && routes.iter().all(|r| !r.is_challenge())
    }

    fn fall_back(
        &self,
        decision: &RoutingDecision,
        classification: &Classification,
        session: &Session,
    ) -> RoutingDecision {
        let text = session.last_learner_text().unwrap_or_default();
        let ctx = RoutingContext::from_session(session, text, self.config.stagnation_window);
        let phase = session.phase.current_phase();

        let mut vetoed = decision.rule_applied.clone();
        loop {
            let next = self
                .engine
                .decide_after(&vetoed, classification, phase, &ctx);
            let eligible =
                rules::find(&next.rule_applied).is_some_and(|r| r.is_challenge_eligible());
            if !eligible {
                let mut next = next;
                next.set_meta("fallback_from", decision.rule_applied.as_str());
                return next;
            }
            vetoed = next.rule_applied;
        }
    }
}

fn not_eligible(decision: RoutingDecision) -> Escalation {
    Escalation {
        decision,
        outcome: EscalationOutcome::NotEligible,
    }
}

/// Route a fired challenge is delivered through.
fn escalated_route(route: Route) -> Route {
    match route {
        Route::CognitiveIntervention
        | Route::KnowledgeWithChallenge
        | Route::MultiAgentComprehensive => route,
        _ => Route::CognitiveChallenge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::heuristic::classify;
    use crate::phase::{PhaseModel, TurnSignals};
    use crate::session::SkillLevel;

    fn controller() -> ChallengeController {
        ChallengeController::new(ChallengeConfig::default())
    }

    /// Records a learner turn and routes it the way the orchestrator does.
    fn learner_turn(session: &mut Session, text: &str) -> (Classification, RoutingDecision) {
        let c = classify(text, &session.turns);
        session.push_learner(text, None);
        session
            .phase
            .advance_if_ready(&TurnSignals::new(text, Some(c.interaction_type)));
        let ctx = RoutingContext::from_session(session, text, 3);
        let d = RoutingEngine::new().decide(&c, session.phase.current_phase(), &ctx);
        (c, d)
    }

    fn new_session() -> Session {
        Session::new("s", SkillLevel::Intermediate, PhaseModel::FivePhase, 3)
    }

    #[test]
    fn test_overconfidence_fires_then_cools_down() {
        let ctl = controller();
        let mut s = new_session();
        let (_, d) = learner_turn(&mut s, "I'm designing a library");
        s.push_tutor("Tell me more", d.route, None);

        let text = "This design is perfect and will work for everyone";
        let (c, d) = learner_turn(&mut s, text);
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert_eq!(esc.decision.route, Route::CognitiveChallenge);
        assert!(esc.payload().is_some());
        s.push_tutor("challenge", esc.decision.route, esc.fired_family());

        let (c, d) = learner_turn(&mut s, text);
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert!(matches!(
            esc.outcome,
            EscalationOutcome::Suppressed {
                reason: SuppressionReason::PrecedingTurn,
                ..
            }
        ));
        assert_eq!(esc.decision.rule_applied, "confident_assertion");
        assert_eq!(esc.decision.route, Route::SocraticExploration);
        assert_eq!(esc.decision.meta_str("fallback_from"), Some("overconfidence"));
        assert!(esc.decision.meta_bool("challenge_suppressed"));
    }

    #[test]
    fn test_strong_phrase_overrides_cooldown() {
        let ctl = controller();
        let mut s = new_session();
        learner_turn(&mut s, "hello there");
        let (c, d) = learner_turn(&mut s, "This is perfect, nothing to improve");
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert!(esc.payload().is_some());

        let (c, d) = learner_turn(&mut s, "Fine, pretend you are a visitor and challenge me");
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        let payload = esc.payload().expect("strong phrase must fire");
        assert_eq!(payload.family, ChallengeFamily::RolePlay);
        assert_eq!(payload.trigger, ChallengeTrigger::ExplicitRequest);
        assert!(esc.decision.meta_bool("cooldown_overridden"));
    }

    #[test]
    fn test_clarification_is_never_escalated() {
        let ctl = controller();
        let mut s = new_session();
        learner_turn(&mut s, "hello there");
        let (c, d) = learner_turn(&mut s, "I'm confused, pretend to be a user?");
        assert_eq!(d.route, Route::SocraticClarification);
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert_eq!(esc.outcome, EscalationOutcome::NotEligible);
        assert!(s.cooldowns.entries().is_empty());
    }

    #[test]
    fn test_protected_route_needs_strong_phrase() {
        let ctl = ChallengeController::new(ChallengeConfig {
            engagement_boost_every: 2,
            ..ChallengeConfig::default()
        });
        let mut s = new_session();
        learner_turn(&mut s, "hello there");
        let (c, d) = learner_turn(&mut s, "What is a parti diagram?");
        assert_eq!(d.route, Route::KnowledgeOnly);
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert_eq!(esc.outcome, EscalationOutcome::NotEligible);
        assert_eq!(esc.decision.route, Route::KnowledgeOnly);
    }

    #[test]
    fn test_engagement_boost_can_be_disabled() {
        let ctl = ChallengeController::new(ChallengeConfig {
            engagement_boost_every: 0,
            stagnation_window: 0,
            ..ChallengeConfig::default()
        });
        let mut s = new_session();
        for text in ["hello there", "my layout has two wings", "should I add a stair"] {
            let (c, d) = learner_turn(&mut s, text);
            let esc = ctl.maybe_escalate(d, &c, &mut s);
            assert_eq!(esc.outcome, EscalationOutcome::NotEligible);
            s.push_tutor("ok", esc.decision.route, None);
        }
    }

    #[test]
    fn test_family_window_blocks_same_context() {
        let ctl = ChallengeController::new(ChallengeConfig {
            cooldown_window_turns: 4,
            engagement_boost_every: 0,
            ..ChallengeConfig::default()
        });
        let mut s = new_session();
        learner_turn(&mut s, "hello there");
        let text = "It is flawless, obviously";
        let (c, d) = learner_turn(&mut s, text);
        assert!(ctl.maybe_escalate(d, &c, &mut s).payload().is_some());
        learner_turn(&mut s, "let me think");
        let (c, d) = learner_turn(&mut s, text);
        let esc = ctl.maybe_escalate(d, &c, &mut s);
        assert!(matches!(
            esc.outcome,
            EscalationOutcome::Suppressed {
                reason: SuppressionReason::FamilyWindow,
                ..
            }
        ));
    }
}
