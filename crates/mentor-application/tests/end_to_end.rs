//! Full-pipeline scenarios with the offline generator and the built-in corpus.

use async_trait::async_trait;
use mentor_application::{TurnError, TurnInput, TurnOrchestrator, build_orchestrator};
use mentor_core::challenge::EscalationOutcome;
use mentor_core::config::MentorConfig;
use mentor_core::routing::Route;
use mentor_core::session::{Session, SessionRepository, SkillLevel, TurnRole};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MemoryRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn find_by_id(&self, session_id: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Session>> {
        Ok(self.sessions.lock().unwrap().values().cloned().collect())
    }
}

fn orchestrator() -> (TurnOrchestrator, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::default());
    let orchestrator = build_orchestrator(MentorConfig::default(), repo.clone()).unwrap();
    (orchestrator, repo)
}

#[tokio::test]
async fn knowledge_question_routes_to_knowledge_only() {
    let (o, _) = orchestrator();
    let handle = o.sessions().create(SkillLevel::Intermediate).await.unwrap();

    let outcome = o
        .handle_turn(
            &handle,
            TurnInput::text("What are the best practices for circulation design?"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.reply.route, Route::KnowledgeOnly);
    assert!(outcome.classification.is_pure_knowledge_request);
    assert_eq!(outcome.decision.rule_applied, "pure_knowledge");
    assert!(outcome.decision.meta_bool("is_pure_knowledge_request"));
    assert!(outcome.reply.text.contains("Key points:"));
    assert_eq!(outcome.reply.citations[0].title, "Circulation Design Principles");
    assert!(outcome.reply.challenge_payload.is_none());
}

#[tokio::test]
async fn overconfidence_fires_then_cools_down() {
    let (o, repo) = orchestrator();
    let handle = o.sessions().create(SkillLevel::Intermediate).await.unwrap();
    let cancel = CancellationToken::new();

    let opening = o
        .handle_turn(&handle, TurnInput::text("I'm designing a community library for my town."), &cancel)
        .await
        .unwrap();
    assert_eq!(opening.reply.route, Route::ProgressiveOpening);

    let overconfident = "This design is perfect and will work for everyone";
    let fired = o
        .handle_turn(&handle, TurnInput::text(overconfident), &cancel)
        .await
        .unwrap();
    assert_eq!(fired.reply.route, Route::CognitiveChallenge);
    assert!(matches!(fired.escalation, EscalationOutcome::Fired(_)));
    let payload = fired.reply.challenge_payload.as_ref().expect("challenge payload");
    assert_eq!(payload.steps.len(), 3);
    assert!(fired.reply.text.contains(&payload.title));

    let repeated = o
        .handle_turn(&handle, TurnInput::text(overconfident), &cancel)
        .await
        .unwrap();
    assert_eq!(repeated.reply.route, Route::SocraticExploration);
    assert!(matches!(repeated.escalation, EscalationOutcome::Suppressed { .. }));
    assert_eq!(repeated.decision.meta_str("fallback_from"), Some("overconfidence"));
    assert!(repeated.reply.challenge_payload.is_none());

    let session = handle.lock().await;
    assert_eq!(session.turns.len(), 6);
    assert_eq!(session.turns[3].challenge_family, Some(payload.family));
    let stored = repo.sessions.lock().unwrap()[&session.id].clone();
    assert_eq!(stored, *session);
}

#[tokio::test]
async fn cancelled_turn_leaves_session_untouched() {
    let (o, _) = orchestrator();
    let handle = o.sessions().create(SkillLevel::Beginner).await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = o
        .handle_turn(&handle, TurnInput::text("What is a parti?"), &cancel)
        .await;
    assert_eq!(result.unwrap_err(), TurnError::Cancelled);
    assert!(handle.lock().await.turns.is_empty());
}

#[tokio::test]
async fn every_turn_gets_a_reply_and_alternates_roles() {
    let (o, _) = orchestrator();
    let handle = o.sessions().create(SkillLevel::Beginner).await.unwrap();
    let cancel = CancellationToken::new();

    for text in [
        "hi",
        "ok",
        "I'm confused about what a section drawing shows",
        "Can you show me examples of courtyard schools?",
        "I don't want examples, just help me figure out my entrance",
    ] {
        let outcome = o.handle_turn(&handle, TurnInput::text(text), &cancel).await.unwrap();
        assert!(!outcome.reply.text.trim().is_empty(), "{text}");
        if text.starts_with("Can you show me") {
            assert_eq!(outcome.reply.route, Route::ExampleRequest);
        }
        if text.starts_with("I don't want") {
            assert_ne!(outcome.reply.route, Route::ExampleRequest);
        }
    }

    let session = handle.lock().await;
    let roles: Vec<_> = session.turns.iter().map(|t| t.role).collect();
    assert!(roles.chunks(2).all(|pair| pair == [TurnRole::Learner, TurnRole::Tutor]));
}

#[tokio::test]
async fn image_summary_reaches_the_session() {
    let (o, _) = orchestrator();
    let handle = o.sessions().create(SkillLevel::Advanced).await.unwrap();
    o.handle_turn(
        &handle,
        TurnInput::text("Here is my site plan").with_image_summary("a sloped site with a river to the north"),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let session = handle.lock().await;
    assert_eq!(
        session.turns[0].image_summary.as_deref(),
        Some("a sloped site with a river to the north")
    );
}
