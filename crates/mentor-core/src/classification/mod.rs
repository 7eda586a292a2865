//! Structured classification of a learner utterance.
//!
//! A [`Classification`] is produced once per turn, either by the LLM-backed
//! classifier in `mentor-interaction` or by the local [`heuristic`] fallback,
//! and is treated as an immutable value afterwards.

pub mod heuristic;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The single dominant intent of an utterance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionType {
    DesignGuidance,
    KnowledgeSeeking,
    ExampleRequest,
    ConfusionExpression,
    FeedbackRequest,
    OverconfidentStatement,
    LowEngagement,
    DesignExploration,
    FirstMessage,
    Other,
}

/// How sure of themselves the learner sounds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfidenceLevel {
    Uncertain,
    #[default]
    Neutral,
    Confident,
    Overconfident,
}

/// Coarse three-step scale used for understanding and engagement.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClassificationSource {
    Llm,
    #[default]
    Heuristic,
}

/// Structured reading of one learner utterance.
///
/// Exactly one `interaction_type` is set; the boolean flags are independent
/// observations and may co-occur with any type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub understanding_level: Level,
    #[serde(default)]
    pub engagement_level: Level,
    #[serde(default)]
    pub is_technical_question: bool,
    #[serde(default)]
    pub is_example_request: bool,
    #[serde(default)]
    pub is_pure_knowledge_request: bool,
    #[serde(default)]
    pub shows_confusion: bool,
    #[serde(default)]
    pub shows_negative_context: bool,
    /// Classifier certainty in `[0, 1]`.
    pub confidence_score: f32,
    #[serde(default)]
    pub source: ClassificationSource,
}

impl Classification {
    /// A neutral classification of the given type with every flag cleared.
    pub fn new(interaction_type: InteractionType) -> Self {
        Self {
            interaction_type,
            confidence_level: ConfidenceLevel::Neutral,
            understanding_level: Level::Medium,
            engagement_level: Level::Medium,
            is_technical_question: false,
            is_example_request: false,
            is_pure_knowledge_request: false,
            shows_confusion: false,
            shows_negative_context: false,
            confidence_score: 0.5,
            source: ClassificationSource::Heuristic,
        }
    }

    /// Marks this classification as a fallback result and caps its score.
    pub fn as_fallback(mut self, cap: f32) -> Self {
        self.source = ClassificationSource::Heuristic;
        self.confidence_score = (self.confidence_score * 0.8).min(cap).clamp(0.0, 1.0);
        self
    }

    /// Whether the learner asked for examples and did not rule them out.
    pub fn wants_examples(&self) -> bool {
        (self.is_example_request || self.interaction_type == InteractionType::ExampleRequest)
            && !self.shows_negative_context
    }

    /// Whether this turn reads as confusion, either by type or by flag.
    pub fn is_confused(&self) -> bool {
        self.interaction_type == InteractionType::ConfusionExpression || self.shows_confusion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_lowers_score() {
        let mut c = Classification::new(InteractionType::KnowledgeSeeking);
        c.confidence_score = 0.9;
        c.source = ClassificationSource::Llm;
        let fallback = c.as_fallback(0.5);
        assert_eq!(fallback.source, ClassificationSource::Heuristic);
        assert!(fallback.confidence_score <= 0.5);
    }

    #[test]
    fn test_negative_context_cancels_example_wish() {
        let mut c = Classification::new(InteractionType::ExampleRequest);
        assert!(c.wants_examples());
        c.shows_negative_context = true;
        assert!(!c.wants_examples());
    }

    #[test]
    fn test_deserializes_with_missing_optional_fields() {
        let c: Classification = serde_json::from_str(
            r#"{"interaction_type":"feedback_request","confidence_score":0.7}"#,
        )
        .unwrap();
        assert_eq!(c.interaction_type, InteractionType::FeedbackRequest);
        assert_eq!(c.engagement_level, Level::Medium);
        assert!(!c.is_technical_question);
    }
}
