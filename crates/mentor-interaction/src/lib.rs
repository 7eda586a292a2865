//! LLM-facing side of the tutoring engine: text generators, the intent
//! classifier, knowledge store backends and the specialist responders.

pub mod claude_api_generator;
pub mod intent_classifier;
pub mod knowledge_store;
pub mod offline_generator;
pub mod prompts;
pub mod responders;

pub use claude_api_generator::ClaudeApiGenerator;
pub use intent_classifier::IntentClassifier;
pub use knowledge_store::{CorpusEntry, HttpKnowledgeStore, StaticKnowledgeStore};
pub use offline_generator::OfflineGenerator;
pub use responders::{CognitiveResponder, KnowledgeResponder, SocraticResponder, SynthesisResponder};

use mentor_core::config::{KnowledgeConfig, LlmConfig, LlmProvider};
use mentor_core::knowledge::KnowledgeStore;
use mentor_core::llm::{GenerationError, TextGenerator};
use mentor_core::responder::Responder;
use std::sync::Arc;

/// Builds the generator selected by `[llm].provider`.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let generator: Arc<dyn TextGenerator> = match config.provider {
        LlmProvider::Offline => Arc::new(OfflineGenerator::new()),
        LlmProvider::Claude => Arc::new(ClaudeApiGenerator::from_config(config)?),
    };
    tracing::info!(generator = generator.name(), "Text generator ready");
    Ok(generator)
}

/// Remote store when an endpoint is configured, otherwise the static corpus.
pub fn build_knowledge_store(config: &KnowledgeConfig) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    if let Some(endpoint) = &config.endpoint {
        tracing::info!(endpoint = %endpoint, "Using remote knowledge store");
        return Ok(Arc::new(HttpKnowledgeStore::new(endpoint.clone())));
    }
    let store = match &config.corpus_path {
        Some(path) => StaticKnowledgeStore::from_toml_file(path)?,
        None => StaticKnowledgeStore::builtin(),
    };
    tracing::info!(entries = store.len(), "Using static knowledge corpus");
    Ok(Arc::new(store))
}

/// The four standard responders sharing one generator.
pub fn default_responders(
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn KnowledgeStore>,
    knowledge: &KnowledgeConfig,
) -> Vec<Arc<dyn Responder>> {
    vec![
        Arc::new(SocraticResponder::new(generator.clone())),
        Arc::new(KnowledgeResponder::new(generator.clone(), store, knowledge.clone())),
        Arc::new(CognitiveResponder::new(generator.clone())),
        Arc::new(SynthesisResponder::new(generator)),
    ]
}
