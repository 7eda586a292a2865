//! Prompt templates for the classifier and the responders.

use minijinja::{Environment, Value};
use once_cell::sync::Lazy;

pub const CLASSIFIER: &str = "classifier";
pub const KNOWLEDGE: &str = "knowledge";
pub const SOCRATIC: &str = "socratic";
pub const COGNITIVE: &str = "cognitive";
pub const SYNTHESIS: &str = "synthesis";

const CLASSIFIER_TEMPLATE: &str = r#"Classify the learner's latest message in an architecture design tutoring conversation.
{% if history %}
Recent conversation (oldest first):
{% for turn in history %}- {{ turn.role }}: {{ turn.text }}
{% endfor %}{% endif %}
Latest message: "{{ utterance }}"
{% if image_summary %}Attached image summary: {{ image_summary }}
{% endif %}
Answer with one JSON object and nothing else, using these fields:
- "interaction_type": one of {{ interaction_types | join(", ") }}
- "confidence_level": uncertain | neutral | confident | overconfident
- "understanding_level": low | medium | high
- "engagement_level": low | medium | high
- "is_technical_question", "is_example_request", "is_pure_knowledge_request", "shows_confusion", "shows_negative_context": booleans
- "confidence_score": number between 0 and 1"#;

const KNOWLEDGE_TEMPLATE: &str = r#"The learner ({{ skill_level }}, {{ phase }} phase) asked: "{{ utterance }}"
{% if domain %}Project context: {{ domain }}.
{% endif %}
Source excerpts:
{% for hit in hits %}[{{ loop.index }}] {{ hit.source_title }}: {{ hit.content }}
{% endfor %}
Rewrite the draft below as short, factual statements grounded only in the excerpts. One statement per line, no questions.
<draft>
{{ draft }}
</draft>"#;

const SOCRATIC_TEMPLATE: &str = r#"You are a Socratic design tutor. Route: {{ route }}. Phase: {{ phase }}. Learner level: {{ skill_level }}.
{% if domain %}Project context: {{ domain }}.
{% endif %}{% if image_summary %}The learner shared an image: {{ image_summary }}
{% endif %}Learner: "{{ utterance }}"
Do not give the answer. Acknowledge the learner in one sentence, then ask exactly one guiding question. Refine the draft below.
<draft>
{{ draft }}
</draft>"#;

const COGNITIVE_TEMPLATE: &str = r#"You design short cognitive challenges for architecture students.
Learner: "{{ utterance }}" (phase: {{ phase }})
{% if challenge %}Challenge family: {{ challenge.family }}. Title: {{ challenge.title }}.
{% endif %}Keep the structure of the draft: title, scenario, numbered steps, reward. Make it vivid and specific to the project.
<draft>
{{ draft }}
</draft>"#;

const SYNTHESIS_TEMPLATE: &str = r#"Summarize where the learner stands in their design process.
Phase: {{ phase }}. Learner level: {{ skill_level }}.
{% for turn in history %}- {{ turn.role }}: {{ turn.text }}
{% endfor %}
Write two or three plain statements connecting their ideas, then one question about what to develop next. Refine the draft below.
<draft>
{{ draft }}
</draft>"#;

static ENVIRONMENT: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in [
        (CLASSIFIER, CLASSIFIER_TEMPLATE),
        (KNOWLEDGE, KNOWLEDGE_TEMPLATE),
        (SOCRATIC, SOCRATIC_TEMPLATE),
        (COGNITIVE, COGNITIVE_TEMPLATE),
        (SYNTHESIS, SYNTHESIS_TEMPLATE),
    ] {
        env.add_template(name, source)
            .expect("built-in prompt template is valid");
    }
    env
});

/// Renders a built-in template with the given context.
pub fn render(name: &str, ctx: Value) -> Result<String, minijinja::Error> {
    ENVIRONMENT.get_template(name)?.render(ctx)
}
