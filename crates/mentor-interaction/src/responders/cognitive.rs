use super::{COGNITIVE_PERSONA, base_context, refine};
use crate::prompts;
use async_trait::async_trait;
use mentor_core::llm::TextGenerator;
use mentor_core::responder::{
    Responder, ResponderError, ResponderReply, ResponderRequest, ResponderRole,
};
use std::sync::Arc;
use std::time::Duration;

/// Phrases the challenge picked by the trigger controller, or a short
/// reflection exercise when none fired.
pub struct CognitiveResponder {
    generator: Arc<dyn TextGenerator>,
    estimated_latency: Duration,
}

impl CognitiveResponder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            estimated_latency: Duration::from_secs(2),
        }
    }

    pub fn with_estimated_latency(mut self, latency: Duration) -> Self {
        self.estimated_latency = latency;
        self
    }
}

fn draft(request: &ResponderRequest) -> String {
    match &request.challenge {
        Some(payload) => payload.render(),
        None => format!(
            "Stress-test one assumption behind {}. Write down the decision you are most sure of and imagine it failing. What would have to be true for it to fail?",
            request.domain.subject()
        ),
    }
}

#[async_trait]
impl Responder for CognitiveResponder {
    fn role(&self) -> ResponderRole {
        ResponderRole::Cognitive
    }

    fn estimated_latency(&self) -> Duration {
        self.estimated_latency
    }

    async fn respond(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let ctx = minijinja::context! {
            draft => draft(request),
            challenge => request.challenge.as_ref(),
            ..base_context(request)
        };
        let text = refine(
            self.generator.as_ref(),
            &COGNITIVE_PERSONA,
            prompts::COGNITIVE,
            ctx,
            request,
        )
        .await?;
        Ok(ResponderReply {
            text,
            citations: Vec::new(),
            challenge: request.challenge.clone(),
        })
    }
}
