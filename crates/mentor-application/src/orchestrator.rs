//! Turn orchestrator: runs one learner turn through the whole pipeline.
//!
//! classify → record turn + phase check → route → challenge escalation →
//! dispatch → synthesize → commit. The session is worked on as a clone and
//! only committed once the reply exists, so a cancelled turn leaves no trace.

use crate::session::{SessionHandle, SessionManager};
use mentor_core::challenge::{ChallengeController, EscalationOutcome};
use mentor_core::classification::Classification;
use mentor_core::config::MentorConfig;
use mentor_core::context::DomainContext;
use mentor_core::llm::TextGenerator;
use mentor_core::phase::{PhaseTransition, TurnSignals};
use mentor_core::reply::FinalReply;
use mentor_core::responder::{Responder, ResponderRequest};
use mentor_core::routing::{RoutingContext, RoutingDecision, RoutingEngine};
use mentor_core::synthesis::Synthesizer;
use mentor_execution::AgentDispatcher;
use mentor_interaction::IntentClassifier;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// One learner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    pub utterance: String,
    /// Text produced by an external image analysis service, if an image was attached.
    pub image_summary: Option<String>,
}

impl TurnInput {
    pub fn text(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            image_summary: None,
        }
    }

    pub fn with_image_summary(mut self, summary: impl Into<String>) -> Self {
        self.image_summary = Some(summary.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The caller cancelled the turn; the session is unchanged.
    #[error("turn cancelled")]
    Cancelled,
}

/// Reply plus the decisions that produced it.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: FinalReply,
    pub classification: Classification,
    pub decision: RoutingDecision,
    pub escalation: EscalationOutcome,
    pub phase_transition: Option<PhaseTransition>,
}

pub struct TurnOrchestrator {
    classifier: IntentClassifier,
    engine: RoutingEngine,
    controller: ChallengeController,
    dispatcher: AgentDispatcher,
    synthesizer: Synthesizer,
    sessions: Arc<SessionManager>,
    config: MentorConfig,
}

impl TurnOrchestrator {
    pub fn new(
        config: MentorConfig,
        generator: Arc<dyn TextGenerator>,
        responders: Vec<Arc<dyn Responder>>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(generator, config.classifier.clone()),
            engine: RoutingEngine::new(),
            controller: ChallengeController::new(config.challenge.clone()),
            dispatcher: AgentDispatcher::new(responders, config.dispatch.clone()),
            synthesizer: Synthesizer::new(config.synthesis.clone()),
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn config(&self) -> &MentorConfig {
        &self.config
    }

    /// Handles one learner turn.
    ///
    /// Turns of the same session are serialized by the session mutex. The
    /// learner always gets a reply unless the turn is cancelled; a failed
    /// save is logged and does not fail the turn.
    pub async fn handle_turn(
        &self,
        handle: &SessionHandle,
        input: TurnInput,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, TurnError> {
        let mut guard = handle.lock().await;
        let turn = guard.learner_turn_count() + 1;
        let span = tracing::info_span!("turn", session_id = %guard.id, turn);

        async {
            let mut session = guard.clone();
            let history = session
                .history_window(self.config.classifier.history_window)
                .to_vec();

            let classification = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TurnError::Cancelled),
                c = self.classifier.classify(&input.utterance, &history, input.image_summary.as_deref()) => c,
            };

            // Checkpoint: learner turn and phase.
            session.push_learner(input.utterance.clone(), input.image_summary.clone());
            let phase_transition = session.phase.advance_if_ready(&TurnSignals::new(
                &input.utterance,
                Some(classification.interaction_type),
            ));
            let phase = session.phase.current_phase();

            let ctx = RoutingContext::from_session(
                &session,
                &input.utterance,
                self.config.challenge.stagnation_window,
            );
            let decision = self.engine.decide(&classification, phase, &ctx);
            let escalation = self
                .controller
                .maybe_escalate(decision, &classification, &mut session);
            let route = escalation.decision.route;

            let domain_window = self.config.challenge.context_window_turns * 2;
            let request = ResponderRequest {
                utterance: input.utterance.clone(),
                route,
                classification: classification.clone(),
                phase,
                skill_level: session.skill_level,
                domain: DomainContext::detect(&input.utterance, last(&history, domain_window)),
                history,
                challenge: escalation.payload().cloned(),
                image_summary: input.image_summary.clone(),
            };

            let dispatched = self
                .dispatcher
                .dispatch(route, Arc::new(request), cancel)
                .await
                .map_err(|_| TurnError::Cancelled)?;

            let mut reply = self.synthesizer.synthesize(
                route,
                &dispatched.outputs,
                &classification,
                session.learner_turn_count(),
            );
            if let Some(payload) = escalation.payload() {
                reply.attach_challenge(payload.clone());
            }
            for (key, value) in &escalation.decision.metadata {
                reply.metadata.entry(key.clone()).or_insert_with(|| value.clone());
            }
            reply
                .metadata
                .insert("rule_applied".to_string(), escalation.decision.rule_applied.clone().into());
            if !dispatched.skipped_roles.is_empty() {
                reply.metadata.insert(
                    "skipped_roles".to_string(),
                    dispatched
                        .skipped_roles
                        .iter()
                        .map(|r| serde_json::Value::from(r.to_string()))
                        .collect::<Vec<_>>()
                        .into(),
                );
            }

            if cancel.is_cancelled() {
                return Err(TurnError::Cancelled);
            }

            // Checkpoint: tutor turn, then commit.
            session.push_tutor(reply.text.clone(), route, escalation.fired_family());
            *guard = session;
            if let Err(err) = self.sessions.save(&guard).await {
                tracing::warn!(target: "mentor::turn", error = %err, "Failed to persist session");
            }

            tracing::info!(
                target: "mentor::turn",
                route = %route,
                rule = %escalation.decision.rule_applied,
                degraded = reply.is_degraded(),
                "Turn complete"
            );

            Ok(TurnOutcome {
                reply,
                classification,
                decision: escalation.decision,
                escalation: escalation.outcome,
                phase_transition,
            })
        }
        .instrument(span)
        .await
    }
}

fn last<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
