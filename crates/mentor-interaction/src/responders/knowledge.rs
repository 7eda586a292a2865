use super::{KNOWLEDGE_PERSONA, base_context, refine};
use crate::prompts;
use async_trait::async_trait;
use mentor_core::config::KnowledgeConfig;
use mentor_core::knowledge::{KnowledgeHit, KnowledgeQuery, KnowledgeStore};
use mentor_core::llm::TextGenerator;
use mentor_core::responder::{
    Citation, Responder, ResponderError, ResponderReply, ResponderRequest, ResponderRole,
};
use mentor_core::routing::Route;
use mentor_core::synthesis::text::statements;
use std::sync::Arc;
use std::time::Duration;

/// Answers from retrieved design knowledge, with citations.
pub struct KnowledgeResponder {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn KnowledgeStore>,
    config: KnowledgeConfig,
    estimated_latency: Duration,
}

impl KnowledgeResponder {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn KnowledgeStore>,
        config: KnowledgeConfig,
    ) -> Self {
        Self {
            generator,
            store,
            config,
            estimated_latency: Duration::from_secs(3),
        }
    }

    pub fn with_estimated_latency(mut self, latency: Duration) -> Self {
        self.estimated_latency = latency;
        self
    }
}

/// Example replies list one statement per source so that statements and
/// citations line up; other routes take up to two statements per source.
fn draft(route: Route, hits: &[KnowledgeHit]) -> String {
    let per_hit = if route == Route::ExampleRequest { 1 } else { 2 };
    hits.iter()
        .flat_map(|hit| statements(&hit.content, per_hit))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Responder for KnowledgeResponder {
    fn role(&self) -> ResponderRole {
        ResponderRole::Knowledge
    }

    fn estimated_latency(&self) -> Duration {
        self.estimated_latency
    }

    async fn respond(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let query = KnowledgeQuery {
            query: request.utterance.clone(),
            result_count: self.config.result_count,
            min_similarity: self.config.min_similarity,
        };
        let hits = self
            .store
            .search(&query)
            .await
            .map_err(|e| ResponderError::Failed(e.to_string()))?;
        if hits.is_empty() {
            tracing::debug!(target: "mentor::knowledge", "No knowledge above the similarity threshold");
            return Err(ResponderError::EmptyPayload);
        }

        let ctx = minijinja::context! {
            draft => draft(request.route, &hits),
            hits => &hits,
            ..base_context(request)
        };
        let text = refine(
            self.generator.as_ref(),
            &KNOWLEDGE_PERSONA,
            prompts::KNOWLEDGE,
            ctx,
            request,
        )
        .await?;

        let citations = hits
            .into_iter()
            .map(|hit| Citation {
                title: hit.source_title,
                url: hit.citation_url,
                similarity: hit.similarity,
            })
            .collect();
        Ok(ResponderReply {
            text,
            citations,
            challenge: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_store::StaticKnowledgeStore;
    use crate::responders::test_support::{RecordingGenerator, request};
    use mentor_core::knowledge::KnowledgeError;

    struct DownStore;

    #[async_trait]
    impl KnowledgeStore for DownStore {
        async fn search(&self, _query: &KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
            Err(KnowledgeError::Unavailable("connection refused".to_string()))
        }
    }

    fn responder(store: Arc<dyn KnowledgeStore>) -> KnowledgeResponder {
        KnowledgeResponder::new(
            Arc::new(RecordingGenerator::default()),
            store,
            KnowledgeConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_answers_with_citations() {
        let r = responder(Arc::new(StaticKnowledgeStore::builtin()));
        let reply = r
            .respond(&request(
                "What are the best practices for circulation design?",
                Route::KnowledgeOnly,
            ))
            .await
            .unwrap();
        assert!(reply.text.contains("Circulation should be legible"));
        assert_eq!(reply.citations[0].title, "Circulation Design Principles");
        assert!(!reply.text.contains('?'));
    }

    #[tokio::test]
    async fn test_no_hits_is_empty_payload() {
        let r = responder(Arc::new(StaticKnowledgeStore::builtin()));
        let err = r
            .respond(&request("zzz qqq xxx", Route::KnowledgeOnly))
            .await
            .unwrap_err();
        assert_eq!(err, ResponderError::EmptyPayload);
    }

    #[tokio::test]
    async fn test_store_outage_is_failure() {
        let r = responder(Arc::new(DownStore));
        let err = r
            .respond(&request("what is a plinth?", Route::KnowledgeOnly))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::Failed(msg) if msg.contains("connection refused")));
    }

    #[test]
    fn test_example_draft_has_one_statement_per_hit() {
        let hit = |title: &str| KnowledgeHit {
            content: format!("{title} one. {title} two."),
            source_title: title.to_string(),
            similarity: 0.9,
            citation_url: None,
        };
        let hits = vec![hit("A"), hit("B")];
        assert_eq!(draft(Route::ExampleRequest, &hits), "A one.\nB one.");
        assert_eq!(draft(Route::KnowledgeOnly, &hits).lines().count(), 4);
    }
}
