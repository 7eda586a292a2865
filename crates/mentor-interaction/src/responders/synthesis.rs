use super::{SYNTHESIS_PERSONA, base_context, refine};
use crate::prompts;
use async_trait::async_trait;
use mentor_core::llm::TextGenerator;
use mentor_core::responder::{
    Responder, ResponderError, ResponderReply, ResponderRequest, ResponderRole,
};
use std::sync::Arc;
use std::time::Duration;

const QUOTE_CHARS: usize = 80;

/// Connects the learner's recent ideas into a short summary.
pub struct SynthesisResponder {
    generator: Arc<dyn TextGenerator>,
    estimated_latency: Duration,
}

impl SynthesisResponder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            estimated_latency: Duration::from_secs(3),
        }
    }

    pub fn with_estimated_latency(mut self, latency: Duration) -> Self {
        self.estimated_latency = latency;
        self
    }
}

fn quote(text: &str) -> String {
    let text = text.trim().trim_end_matches(['.', '!', '?']);
    if text.chars().count() <= QUOTE_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(QUOTE_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn draft(request: &ResponderRequest) -> String {
    let earlier: Vec<&str> = request
        .history
        .iter()
        .filter(|t| t.is_learner())
        .map(|t| t.text.as_str())
        .collect();

    let mut lines = Vec::new();
    if let Some(first) = earlier.first() {
        lines.push(format!("You started from \"{}\".", quote(first)));
    }
    match earlier.len() {
        0 | 1 => {}
        2 => lines.push(format!(
            "Since then you have worked through one more idea in the {} phase.",
            request.phase
        )),
        n => lines.push(format!(
            "Since then you have worked through {} more ideas in the {} phase.",
            n - 1,
            request.phase
        )),
    }
    lines.push(format!("Now you are asking about \"{}\".", quote(&request.utterance)));
    lines.push(format!(
        "Which of these ideas will you carry into the next drawing of {}?",
        request.domain.subject()
    ));
    lines.join(" ")
}

#[async_trait]
impl Responder for SynthesisResponder {
    fn role(&self) -> ResponderRole {
        ResponderRole::Synthesis
    }

    fn estimated_latency(&self) -> Duration {
        self.estimated_latency
    }

    async fn respond(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let history: Vec<_> = request
            .history
            .iter()
            .map(|t| minijinja::context! { role => t.role.to_string(), text => t.text.as_str() })
            .collect();
        let ctx = minijinja::context! {
            draft => draft(request),
            history => history,
            ..base_context(request)
        };
        let text = refine(
            self.generator.as_ref(),
            &SYNTHESIS_PERSONA,
            prompts::SYNTHESIS,
            ctx,
            request,
        )
        .await?;
        Ok(ResponderReply::text(text))
    }
}
