//! Interface to the vector knowledge store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnowledgeError {
    #[error("Knowledge store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed knowledge store response: {0}")]
    Malformed(String),
}

/// Search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeQuery {
    pub query: String,
    pub result_count: usize,
    pub min_similarity: f32,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub content: String,
    pub source_title: String,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_url: Option<String>,
}

/// Ranked semantic search over design knowledge.
///
/// An empty result is a normal answer here; the knowledge responder turns it
/// into a role failure.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError>;
}
