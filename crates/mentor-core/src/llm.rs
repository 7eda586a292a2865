//! Interface to the LLM generation service.
//!
//! The classifier and the responders only see [`TextGenerator`]; concrete
//! HTTP and offline backends live in `mentor-interaction`.

use crate::session::{Turn, TurnRole};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure of a generation call.
///
/// Distinguishable from a low-confidence answer: callers fall back on any
/// variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The service answered with an error status or could not be reached.
    #[error("LLM service error (status {status_code:?}): {message}")]
    ProcessError {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built or the response held no usable text.
    #[error("LLM execution failed: {0}")]
    ExecutionFailed(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ProcessError { is_retryable, .. } => *is_retryable,
            GenerationError::Timeout(_) => true,
            GenerationError::ExecutionFailed(_) => false,
        }
    }
}

/// One prior message sent along with a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: TurnRole,
    pub content: String,
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.text.clone(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    /// Bounded window of earlier turns, oldest first.
    pub history: Vec<ChatMessage>,
    /// Overrides the backend's default token limit.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, turns: &[Turn]) -> Self {
        self.history = turns.iter().map(ChatMessage::from).collect();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Free-text completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError>;
}
