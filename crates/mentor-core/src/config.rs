//! Engine configuration model.
//!
//! Every field has a default so that a partial `config.toml` (or none at all)
//! still yields a runnable engine. Loading and layering live in
//! `mentor-infrastructure`; this module only owns the shape and validation.

use crate::error::{MentorError, Result};
use crate::phase::PhaseModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MentorConfig {
    pub classifier: ClassifierConfig,
    pub phase: PhaseConfig,
    pub challenge: ChallengeConfig,
    pub dispatch: DispatchConfig,
    pub synthesis: SynthesisConfig,
    pub llm: LlmConfig,
    pub knowledge: KnowledgeConfig,
    pub storage: StorageConfig,
}

impl MentorConfig {
    /// Rejects values that would make the pipeline stall or misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.classifier.timeout_ms == 0 {
            return Err(MentorError::config("classifier.timeout_ms must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.classifier.fallback_confidence_cap) {
            return Err(MentorError::config(
                "classifier.fallback_confidence_cap must be within [0, 1]",
            ));
        }
        if self.phase.min_turns_per_phase == 0 {
            return Err(MentorError::config("phase.min_turns_per_phase must be > 0"));
        }
        if self.dispatch.responder_timeout_ms == 0 || self.dispatch.turn_budget_ms == 0 {
            return Err(MentorError::config(
                "dispatch timeouts must be > 0 milliseconds",
            ));
        }
        if !(0.0..=1.0).contains(&self.knowledge.min_similarity) {
            return Err(MentorError::config(
                "knowledge.min_similarity must be within [0, 1]",
            ));
        }
        if self.knowledge.result_count == 0 {
            return Err(MentorError::config("knowledge.result_count must be > 0"));
        }
        Ok(())
    }
}

/// Intent classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Hard deadline for the LLM classification call.
    pub timeout_ms: u64,
    /// Number of most recent turns sent along with the utterance.
    pub history_window: usize,
    /// Upper bound for `confidence_score` when the heuristic fallback was used.
    pub fallback_confidence_cap: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 4_000,
            history_window: 6,
            fallback_confidence_cap: 0.5,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Phase tracker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub model: PhaseModel,
    /// Learner turns that must be spent in a phase before it may advance.
    pub min_turns_per_phase: u32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            model: PhaseModel::FivePhase,
            min_turns_per_phase: 3,
        }
    }
}

/// Challenge trigger controller settings.
///
/// The cooldown window and the engagement-boost period had inconsistent
/// defaults historically (3 vs 4), so both are configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    /// A family may not fire again for the same context within this many learner turns.
    pub cooldown_window_turns: u32,
    /// Offer an engagement boost every N learner turns. `0` disables the boost.
    pub engagement_boost_every: u32,
    /// Number of recent turns folded into the context hash.
    pub context_window_turns: usize,
    /// Identical consecutive routes that count as stagnation.
    pub stagnation_window: usize,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            cooldown_window_turns: 3,
            engagement_boost_every: 3,
            context_window_turns: 3,
            stagnation_window: 3,
        }
    }
}

/// Agent dispatcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline applied to every individual responder call.
    pub responder_timeout_ms: u64,
    /// Latency budget used to decide whether optional roles are attempted.
    pub turn_budget_ms: u64,
    /// How long optional roles may keep running once every required role resolved.
    pub optional_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            responder_timeout_ms: 8_000,
            turn_budget_ms: 12_000,
            optional_grace_ms: 300,
        }
    }
}

impl DispatchConfig {
    pub fn responder_timeout(&self) -> Duration {
        Duration::from_millis(self.responder_timeout_ms)
    }

    pub fn turn_budget(&self) -> Duration {
        Duration::from_millis(self.turn_budget_ms)
    }

    pub fn optional_grace(&self) -> Duration {
        Duration::from_millis(self.optional_grace_ms)
    }
}

/// Response synthesizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub max_key_points: usize,
    /// Example replies add an "Apply:" probe once the session has more learner turns than this.
    pub examples_apply_after_turns: usize,
    pub max_examples: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_key_points: 4,
            examples_apply_after_turns: 2,
            max_examples: 3,
        }
    }
}

/// Which text generation backend the responders and classifier use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Deterministic local generation, no network.
    #[default]
    Offline,
    /// Anthropic Messages API.
    Claude,
}

/// LLM service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Offline,
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
            max_tokens: 1024,
        }
    }
}

/// Vector knowledge store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// HTTP search endpoint. When absent the static corpus is used.
    pub endpoint: Option<String>,
    /// TOML corpus for the in-memory store.
    pub corpus_path: Option<PathBuf>,
    pub result_count: usize,
    pub min_similarity: f32,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            corpus_path: None,
            result_count: 4,
            min_similarity: 0.35,
        }
    }
}

/// Session storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the default `<config dir>/sessions` location.
    pub sessions_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MentorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MentorConfig = toml::from_str(
            r#"
            [challenge]
            engagement_boost_every = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.challenge.engagement_boost_every, 4);
        assert_eq!(config.challenge.cooldown_window_turns, 3);
        assert_eq!(config.dispatch.optional_grace_ms, 300);
    }

    #[test]
    fn test_validate_rejects_zero_phase_turns() {
        let mut config = MentorConfig::default();
        config.phase.min_turns_per_phase = 0;
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_validate_rejects_out_of_range_similarity() {
        let mut config = MentorConfig::default();
        config.knowledge.min_similarity = 1.5;
        assert!(config.validate().is_err());
    }
}
