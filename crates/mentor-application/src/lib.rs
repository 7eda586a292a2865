//! Application layer for MENTOR.
//!
//! Wires the classifier, routing engine, challenge controller, dispatcher and
//! synthesizer into a per-turn pipeline, and manages session lifecycle.

pub mod orchestrator;
pub mod session;

pub use orchestrator::{TurnError, TurnInput, TurnOrchestrator, TurnOutcome};
pub use session::{SessionCache, SessionHandle, SessionManager};

use mentor_core::config::MentorConfig;
use mentor_core::session::SessionRepository;
use std::sync::Arc;

/// Builds a ready-to-use orchestrator from configuration.
///
/// Picks the text generator and knowledge store named in `config` and
/// registers the four standard responders.
pub fn build_orchestrator(
    config: MentorConfig,
    repository: Arc<dyn SessionRepository>,
) -> anyhow::Result<TurnOrchestrator> {
    config.validate()?;
    let generator = mentor_interaction::build_generator(&config.llm)?;
    let store = mentor_interaction::build_knowledge_store(&config.knowledge)?;
    let responders =
        mentor_interaction::default_responders(generator.clone(), store, &config.knowledge);
    let sessions = Arc::new(SessionManager::new(repository, config.phase.clone()));
    Ok(TurnOrchestrator::new(config, generator, responders, sessions))
}
