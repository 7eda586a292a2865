//! Specialist responders.
//!
//! Each responder composes a local draft, wraps it in its prompt template and
//! asks the configured [`TextGenerator`] to refine it. The persona supplies
//! the system prompt.

mod cognitive;
mod knowledge;
mod socratic;
mod synthesis;

pub use cognitive::CognitiveResponder;
pub use knowledge::KnowledgeResponder;
pub use socratic::SocraticResponder;
pub use synthesis::SynthesisResponder;

use crate::prompts;
use mentor_core::llm::{CompletionRequest, TextGenerator};
use mentor_core::responder::{ResponderError, ResponderRequest};
use minijinja::Value;

/// Voice of a responder, rendered into its system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub role: &'static str,
    pub communication_style: &'static str,
}

impl Persona {
    pub fn system_prompt(&self) -> String {
        format!(
            "# Persona Profile\n**Name**: {}\n**Role**: {}\n\n## Communication Style\n{}",
            self.name, self.role, self.communication_style
        )
    }
}

pub const SOCRATIC_PERSONA: Persona = Persona {
    name: "Socrates",
    role: "Socratic design tutor",
    communication_style: "Warm and brief. Never hands over answers; asks one question that moves the learner forward.",
};

pub const KNOWLEDGE_PERSONA: Persona = Persona {
    name: "Vitruvius",
    role: "Architectural knowledge specialist",
    communication_style: "Factual and compact. States what the sources say and nothing more.",
};

pub const COGNITIVE_PERSONA: Persona = Persona {
    name: "Daedalus",
    role: "Cognitive challenge designer",
    communication_style: "Playful and concrete. Turns assumptions into short exercises with a clear reward.",
};

pub const SYNTHESIS_PERSONA: Persona = Persona {
    name: "Hestia",
    role: "Design process synthesizer",
    communication_style: "Calm and connective. Links the learner's ideas and points to the next step.",
};

/// Renders `template` and asks the generator to refine it.
pub(crate) async fn refine(
    generator: &dyn TextGenerator,
    persona: &Persona,
    template: &str,
    ctx: Value,
    request: &ResponderRequest,
) -> Result<String, ResponderError> {
    let prompt = prompts::render(template, ctx)
        .map_err(|e| ResponderError::Failed(format!("prompt rendering failed: {e}")))?;
    let completion = CompletionRequest::new(prompt)
        .with_system(persona.system_prompt())
        .with_history(&request.history);

    let text = generator
        .complete(completion)
        .await
        .map_err(|e| ResponderError::Failed(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ResponderError::EmptyPayload);
    }
    Ok(text.to_string())
}

/// Shared template variables describing the turn.
pub(crate) fn base_context(request: &ResponderRequest) -> Value {
    minijinja::context! {
        utterance => request.utterance.as_str(),
        route => request.route.to_string(),
        phase => request.phase.to_string(),
        skill_level => request.skill_level.to_string(),
        domain => request.domain.primary().map(|d| d.replace('_', " ")),
        image_summary => request.image_summary.as_deref(),
    }
}
