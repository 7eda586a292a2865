//! LLM-backed intent classifier with a deterministic local fallback.

use crate::prompts;
use mentor_core::classification::heuristic;
use mentor_core::classification::{
    Classification, ClassificationSource, ConfidenceLevel, InteractionType, Level,
};
use mentor_core::config::ClassifierConfig;
use mentor_core::llm::{CompletionRequest, GenerationError, TextGenerator};
use mentor_core::session::Turn;
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use thiserror::Error;

const SYSTEM: &str = "You are a precise intent classifier. Reply with JSON only.";

/// Why the LLM path produced no classification. Never leaves this module.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("classification service unavailable: {0}")]
    Unavailable(#[from] GenerationError),

    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed classification payload: {0}")]
    Malformed(String),
}

/// Wire shape of the LLM answer. Only `interaction_type` is mandatory.
#[derive(Debug, Deserialize)]
struct LlmClassification {
    interaction_type: InteractionType,
    #[serde(default)]
    confidence_level: ConfidenceLevel,
    #[serde(default)]
    understanding_level: Level,
    #[serde(default)]
    engagement_level: Level,
    #[serde(default)]
    is_technical_question: bool,
    #[serde(default)]
    is_example_request: bool,
    #[serde(default)]
    is_pure_knowledge_request: bool,
    #[serde(default)]
    shows_confusion: bool,
    #[serde(default)]
    shows_negative_context: bool,
    confidence_score: Option<f32>,
}

pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
    config: ClassifierConfig,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, config: ClassifierConfig) -> Self {
        Self { generator, config }
    }

    /// Classifies an utterance. Never fails.
    ///
    /// Any service error, timeout or malformed payload yields the heuristic
    /// classification with a capped confidence score.
    pub async fn classify(
        &self,
        utterance: &str,
        history: &[Turn],
        image_summary: Option<&str>,
    ) -> Classification {
        let start = history.len().saturating_sub(self.config.history_window);
        let window = &history[start..];

        match self.classify_with_llm(utterance, window, image_summary).await {
            Ok(classification) => {
                tracing::debug!(
                    target: "mentor::classifier",
                    interaction_type = %classification.interaction_type,
                    score = classification.confidence_score,
                    "LLM classification"
                );
                classification
            }
            Err(err) => {
                let fallback = heuristic::classify(utterance, window)
                    .as_fallback(self.config.fallback_confidence_cap);
                tracing::warn!(
                    target: "mentor::classifier",
                    generator = self.generator.name(),
                    error = %err,
                    interaction_type = %fallback.interaction_type,
                    "Classification service unavailable, using heuristic fallback"
                );
                fallback
            }
        }
    }

    async fn classify_with_llm(
        &self,
        utterance: &str,
        history: &[Turn],
        image_summary: Option<&str>,
    ) -> Result<Classification, ClassificationError> {
        let turns: Vec<_> = history
            .iter()
            .map(|t| context! { role => t.role.to_string(), text => t.text.clone() })
            .collect();
        let types: Vec<String> = InteractionType::iter().map(|t| t.to_string()).collect();
        let prompt = prompts::render(
            prompts::CLASSIFIER,
            context! {
                utterance => utterance,
                history => turns,
                image_summary => image_summary,
                interaction_types => types,
            },
        )
        .map_err(|e| ClassificationError::Malformed(format!("prompt rendering failed: {e}")))?;

        let request = CompletionRequest::new(prompt)
            .with_system(SYSTEM)
            .with_max_tokens(300);
        let timeout = self.config.timeout();
        let raw = tokio::time::timeout(timeout, self.generator.complete(request))
            .await
            .map_err(|_| ClassificationError::Timeout(timeout))??;

        parse_payload(&raw)
    }
}

/// Parses the first JSON object found in `raw`.
fn parse_payload(raw: &str) -> Result<Classification, ClassificationError> {
    let start = raw
        .find('{')
        .ok_or_else(|| ClassificationError::Malformed("no JSON object in reply".to_string()))?;
    let end = raw
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| ClassificationError::Malformed("unterminated JSON object".to_string()))?;

    let parsed: LlmClassification = serde_json::from_str(&raw[start..=end])
        .map_err(|e| ClassificationError::Malformed(e.to_string()))?;

    let score = parsed.confidence_score.unwrap_or(0.7);
    if !(0.0..=1.0).contains(&score) {
        return Err(ClassificationError::Malformed(format!(
            "confidence_score {score} outside [0, 1]"
        )));
    }

    Ok(Classification {
        interaction_type: parsed.interaction_type,
        confidence_level: parsed.confidence_level,
        understanding_level: parsed.understanding_level,
        engagement_level: parsed.engagement_level,
        is_technical_question: parsed.is_technical_question,
        is_example_request: parsed.is_example_request,
        is_pure_knowledge_request: parsed.is_pure_knowledge_request,
        shows_confusion: parsed.shows_confusion,
        shows_negative_context: parsed.shows_negative_context,
        confidence_score: score,
        source: ClassificationSource::Llm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedGenerator {
        reply: Result<String, GenerationError>,
        delay: Duration,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    fn classifier(reply: Result<String, GenerationError>, delay: Duration) -> IntentClassifier {
        IntentClassifier::new(
            Arc::new(ScriptedGenerator { reply, delay }),
            ClassifierConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_uses_llm_payload() {
        let c = classifier(
            Ok("Sure! {\"interaction_type\":\"feedback_request\",\"confidence_score\":0.9}".to_string()),
            Duration::ZERO,
        );
        let result = c.classify("what do you think?", &[], None).await;
        assert_eq!(result.interaction_type, InteractionType::FeedbackRequest);
        assert_eq!(result.source, ClassificationSource::Llm);
        assert_eq!(result.confidence_score, 0.9);
    }

    #[tokio::test]
    async fn test_service_error_falls_back() {
        let c = classifier(
            Err(GenerationError::ExecutionFailed("down".to_string())),
            Duration::ZERO,
        );
        let result = c
            .classify("What are the best practices for circulation design?", &[], None)
            .await;
        assert_eq!(result.source, ClassificationSource::Heuristic);
        assert!(result.is_pure_knowledge_request);
        assert!(result.confidence_score <= 0.5);
    }

    #[tokio::test]
    async fn test_malformed_payload_falls_back() {
        let c = classifier(
            Ok("{\"interaction_type\":\"not_a_type\"}".to_string()),
            Duration::ZERO,
        );
        let result = c.classify("ok", &[Turn::learner("hi")], None).await;
        assert_eq!(result.source, ClassificationSource::Heuristic);
        assert_eq!(result.interaction_type, InteractionType::LowEngagement);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let c = classifier(
            Ok("{\"interaction_type\":\"other\"}".to_string()),
            Duration::from_secs(30),
        );
        let result = c.classify("I'm confused", &[], None).await;
        assert_eq!(result.source, ClassificationSource::Heuristic);
        assert_eq!(result.interaction_type, InteractionType::ConfusionExpression);
    }

    #[test]
    fn test_out_of_range_score_is_malformed() {
        let err = parse_payload("{\"interaction_type\":\"other\",\"confidence_score\":3.0}").unwrap_err();
        assert!(matches!(err, ClassificationError::Malformed(_)));
    }
}
