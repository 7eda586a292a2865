use super::text::{bullets, last_question, statements};
use super::{Contributions, TemplateId};
use crate::classification::Classification;
use crate::config::SynthesisConfig;
use crate::responder::ResponderRole::{Cognitive, Knowledge, Socratic, Synthesis};

const DEFAULT_APPLY: &str = "How would you apply this to your own design?";
const DEFAULT_EXAMPLES_APPLY: &str = "Which of these could inform a decision in your project, and how?";
const DEFAULT_NEXT: &str = "Test one decision against the people who will actually use the space.";
const DEFAULT_QUESTION: &str = "Which part will you develop next?";

/// Text used when no responder produced anything usable.
pub(super) fn fallback(template: TemplateId) -> &'static str {
    match template {
        TemplateId::Technical => {
            "I couldn't reach the reference material just now. Tell me which part of this topic matters most for your project and we'll reason it through together."
        }
        TemplateId::Examples => {
            "I couldn't pull up precedents just now. Describe the kind of project you'd like to compare against and we'll look at what makes it work."
        }
        TemplateId::Clarification => {
            "Let's slow down. Which part feels least clear right now: the idea itself, or how it applies to your design?"
        }
        TemplateId::Challenge => {
            "Here's a quick challenge: pick your strongest design decision and argue against it. Does it survive?"
        }
        TemplateId::MultiAgent => {
            "Let's step back and look at the whole scheme. Next: list the three decisions that define it. Which one are you least sure about?"
        }
        TemplateId::Guidance => {
            "Let's keep developing your idea. What is the one thing your design must get right?"
        }
        TemplateId::Opening => {
            "Welcome! Tell me about the project you're working on: the site, the people it serves, and what excites you about it."
        }
    }
}

/// Renders the template, or `None` when none of its sections has content.
pub(super) fn render(
    template: TemplateId,
    c: &Contributions<'_>,
    classification: &Classification,
    turn_count: u32,
    config: &SynthesisConfig,
) -> Option<String> {
    let sections = match template {
        TemplateId::Technical => technical(c, config),
        TemplateId::Examples => examples(c, turn_count, config),
        TemplateId::Clarification => clarification(c, classification),
        TemplateId::Challenge => challenge(c),
        TemplateId::MultiAgent => multi_agent(c, config),
        TemplateId::Guidance => guidance(c, config),
        TemplateId::Opening => opening(c),
    };
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn technical(c: &Contributions<'_>, config: &SynthesisConfig) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        let lead = statements(socratic, 2);
        if !lead.is_empty() {
            sections.push(lead.join(" "));
        }
    }
    if let Some(knowledge) = c.get(Knowledge) {
        let points = statements(knowledge, config.max_key_points);
        if !points.is_empty() {
            sections.push(format!("Key points:\n{}", bullets(&points)));
        }
    }
    if sections.is_empty() {
        return sections;
    }
    let apply = c
        .get(Socratic)
        .and_then(last_question)
        .unwrap_or_else(|| DEFAULT_APPLY.to_string());
    sections.push(format!("Apply: {apply}"));
    sections
}

fn examples(c: &Contributions<'_>, turn_count: u32, config: &SynthesisConfig) -> Vec<String> {
    let Some(knowledge) = c.get(Knowledge) else {
        return Vec::new();
    };
    let citations = c.citations(Knowledge);
    let items: Vec<String> = statements(knowledge, config.max_examples)
        .into_iter()
        .enumerate()
        .map(|(i, item)| match citations.get(i) {
            Some(citation) => format!("{}. {} ({})", i + 1, item, citation.title),
            None => format!("{}. {}", i + 1, item),
        })
        .collect();
    if items.is_empty() {
        return Vec::new();
    }

    let mut sections = vec![format!("Examples:\n{}", items.join("\n"))];
    if turn_count as usize > config.examples_apply_after_turns {
        sections.push(format!("Apply: {DEFAULT_EXAMPLES_APPLY}"));
    }
    sections
}

fn clarification(c: &Contributions<'_>, classification: &Classification) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        if classification.is_confused() {
            sections.push(format!("Let's untangle this step by step. {socratic}"));
        } else {
            sections.push(socratic.to_string());
        }
    }
    if let Some(knowledge) = c.get(Knowledge) {
        let points = statements(knowledge, 2);
        if !points.is_empty() {
            sections.push(format!("Background:\n{}", bullets(&points)));
        }
    }
    sections
}

fn challenge(c: &Contributions<'_>) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        let lead = statements(socratic, 2);
        if !lead.is_empty() {
            sections.push(lead.join(" "));
        }
    }
    if let Some(cognitive) = c.get(Cognitive) {
        sections.push(format!("Challenge: {cognitive}"));
    }
    if let Some(question) = c.get(Socratic).and_then(last_question) {
        if !sections.is_empty() {
            sections.push(question);
        }
    }
    sections
}

fn multi_agent(c: &Contributions<'_>, config: &SynthesisConfig) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        let lead = statements(socratic, 2);
        if !lead.is_empty() {
            sections.push(lead.join(" "));
        }
    }

    let points = c
        .get(Knowledge)
        .map(|k| statements(k, config.max_key_points))
        .unwrap_or_default();
    if !points.is_empty() {
        sections.push(format!("Key points:\n{}", bullets(&points)));
    }

    // The summary never repeats a key point.
    let fresh = |text: &str, max: usize| -> Vec<String> {
        statements(text, max + points.len())
            .into_iter()
            .filter(|s| !points.contains(s))
            .take(max)
            .collect()
    };
    let summary = c
        .get(Synthesis)
        .map(|s| fresh(s, 2).join(" "))
        .filter(|s| !s.is_empty())
        .or_else(|| c.get(Knowledge).and_then(|k| fresh(k, 1).into_iter().next()))
        .unwrap_or_else(|| {
            "Here is how the pieces of your scheme fit together so far.".to_string()
        });
    sections.push(format!("Synthesis: {summary}"));

    let next = c
        .get(Cognitive)
        .and_then(|s| statements(s, 1).into_iter().next())
        .unwrap_or_else(|| DEFAULT_NEXT.to_string());
    sections.push(format!("Next: {next}"));

    let question = [Socratic, Cognitive, Synthesis]
        .into_iter()
        .find_map(|role| c.get(role).and_then(last_question))
        .unwrap_or_else(|| DEFAULT_QUESTION.to_string());
    sections.push(question);
    sections
}

fn guidance(c: &Contributions<'_>, config: &SynthesisConfig) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        let lead = statements(socratic, 3);
        if !lead.is_empty() {
            sections.push(lead.join(" "));
        }
    }
    if let Some(knowledge) = c.get(Knowledge) {
        let points = statements(knowledge, config.max_key_points);
        if !points.is_empty() {
            sections.push(format!("Background:\n{}", bullets(&points)));
        }
    }
    if let Some(cognitive) = c.get(Cognitive) {
        let lead = statements(cognitive, 2);
        if !lead.is_empty() {
            sections.push(format!("Challenge: {}", lead.join(" ")));
        }
    }
    if sections.is_empty() {
        return sections;
    }
    let question = [Socratic, Cognitive]
        .into_iter()
        .find_map(|role| c.get(role).and_then(last_question))
        .unwrap_or_else(|| DEFAULT_QUESTION.to_string());
    sections.push(question);
    sections
}

fn opening(c: &Contributions<'_>) -> Vec<String> {
    let mut sections = Vec::new();
    if let Some(socratic) = c.get(Socratic) {
        sections.push(socratic.to_string());
    }
    if let Some(knowledge) = c.get(Knowledge) {
        let points = statements(knowledge, 2);
        if !points.is_empty() {
            sections.push(format!("Background:\n{}", bullets(&points)));
        }
    }
    sections
}
