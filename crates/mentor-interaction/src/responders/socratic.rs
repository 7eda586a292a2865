use super::{SOCRATIC_PERSONA, base_context, refine};
use crate::prompts;
use async_trait::async_trait;
use mentor_core::llm::TextGenerator;
use mentor_core::phase::Phase;
use mentor_core::responder::{
    Responder, ResponderError, ResponderReply, ResponderRequest, ResponderRole,
};
use mentor_core::routing::Route;
use std::sync::Arc;
use std::time::Duration;

/// Asks guiding questions instead of giving answers.
pub struct SocraticResponder {
    generator: Arc<dyn TextGenerator>,
    estimated_latency: Duration,
}

impl SocraticResponder {
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

fn acknowledgement(request: &ResponderRequest, subject: &str) -> String {
    match request.route {
        Route::SocraticClarification | Route::SupportiveScaffolding => {
            "That is a reasonable thing to be unsure about, so let's take it one piece at a time.".to_string()
        }
        Route::ProgressiveOpening => {
            format!("Welcome! It's good to start by getting to know {subject}.")
        }
        Route::CognitiveChallenge | Route::CognitiveIntervention => {
            "Before going further, let's put that thinking under some pressure.".to_string()
        }
        Route::FoundationalBuilding => {
            "Let's make sure the foundations are solid before building on them.".to_string()
        }
        Route::KnowledgeOnly | Route::ExampleRequest => {
            format!("Here is some grounding you can use for {subject}.")
        }
        _ => format!("That's a useful direction for {subject}."),
    }
}

fn guiding_question(request: &ResponderRequest, subject: &str) -> String {
    if request.classification.is_confused() {
        return format!("Which single part of {subject} feels least clear to you right now?");
    }
    match request.route {
        Route::ProgressiveOpening => {
            return format!("Who will use {subject} most, and what should they feel when they arrive?");
        }
        Route::CognitiveChallenge | Route::CognitiveIntervention => {
            return "Which of your assumptions would you drop first if it turned out to be wrong?".to_string();
        }
        Route::ExampleRequest => {
            return "What do you hope to learn from looking at other projects?".to_string();
        }
        _ => {}
    }
    match request.phase {
        Phase::Discovery => format!("What do you know about the people and the site of {subject} so far?"),
        Phase::Exploration => format!("What would change in {subject} if you tried a completely different arrangement?"),
        Phase::Synthesis => format!("Which single idea ties your decisions for {subject} together?"),
        Phase::Application => format!("How would that idea hold up on the real site of {subject}?"),
        Phase::Reflection => "What would you do differently if you started again tomorrow?".to_string(),
        Phase::Ideation => format!("What core experience do you want {subject} to offer?"),
        Phase::Visualization => "Which drawing or model would test that idea fastest?".to_string(),
        Phase::Materialization => format!("Which material choice supports the concept of {subject} most directly?"),
    }
}

/// One acknowledgement sentence followed by exactly one question.
fn draft(request: &ResponderRequest) -> String {
    let subject = request.domain.subject();
    let mut text = acknowledgement(request, &subject);
    if let Some(summary) = request.image_summary.as_deref() {
        text.push_str(&format!(" Your image shows {}.", summary.trim_end_matches('.')));
    }
    text.push(' ');
    text.push_str(&guiding_question(request, &subject));
    text
}

#[async_trait]
impl Responder for SocraticResponder {
    fn role(&self) -> ResponderRole {
        ResponderRole::Socratic
    }

    fn estimated_latency(&self) -> Duration {
        self.estimated_latency
    }

    async fn respond(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let ctx = minijinja::context! {
            draft => draft(request),
            ..base_context(request)
        };
        let text = refine(
            self.generator.as_ref(),
            &SOCRATIC_PERSONA,
            prompts::SOCRATIC,
            ctx,
            request,
        )
        .await?;
        Ok(ResponderReply::text(text))
    }
}
