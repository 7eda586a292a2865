//! Deterministic generator used when no LLM service is configured.
//!
//! Responders put a locally composed draft between `<draft>` tags in their
//! prompt; an LLM is asked to refine it, this generator returns it verbatim.
//! Prompts without a draft (such as the classifier's) fail, which sends the
//! caller down its fallback path.

use async_trait::async_trait;
use mentor_core::llm::{CompletionRequest, GenerationError, TextGenerator};

pub const DRAFT_OPEN: &str = "<draft>";
pub const DRAFT_CLOSE: &str = "</draft>";

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }
}

/// Text between the first draft tags of `prompt`.
pub fn extract_draft(prompt: &str) -> Option<&str> {
    let start = prompt.find(DRAFT_OPEN)? + DRAFT_OPEN.len();
    let end = prompt[start..].find(DRAFT_CLOSE)? + start;
    let draft = prompt[start..end].trim();
    (!draft.is_empty()).then_some(draft)
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        extract_draft(&request.prompt)
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::ExecutionFailed("offline generator received no draft".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_draft_verbatim() {
        let prompt = "Refine this.\n<draft>\nKeep corridors short.\n</draft>\nThanks";
        let text = OfflineGenerator::new()
            .complete(CompletionRequest::new(prompt))
            .await
            .unwrap();
        assert_eq!(text, "Keep corridors short.");
    }

    #[tokio::test]
    async fn test_without_draft_fails() {
        let result = OfflineGenerator::new()
            .complete(CompletionRequest::new("Classify: hello"))
            .await;
        assert!(matches!(result, Err(GenerationError::ExecutionFailed(_))));
        assert_eq!(extract_draft("<draft>   </draft>"), None);
    }
}
