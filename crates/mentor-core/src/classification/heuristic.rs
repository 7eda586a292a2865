//! Deterministic local classifier.
//!
//! Used whenever the LLM classification service is unavailable. It is a pure
//! function of the utterance and history: the same input always yields the
//! same [`Classification`].
//!
//! The interaction type is picked from ordered phrase lists:
//! confusion > example request > design guidance > knowledge seeking >
//! feedback > overconfidence > low engagement > exploration > first message > other.

use super::{Classification, ClassificationSource, ConfidenceLevel, InteractionType, Level};
use crate::session::{Turn, TurnRole};
use once_cell::sync::Lazy;
use regex::Regex;

/// A phrase list compiled into one alternation.
///
/// A phrase edge that is a word character only matches at a word boundary,
/// so "perfect" does not match "imperfect".
pub(crate) struct PhraseSet(Regex);

impl PhraseSet {
    pub(crate) fn new(phrases: &[&str]) -> Self {
        let alternation = phrases
            .iter()
            .map(|phrase| bounded(phrase))
            .collect::<Vec<_>>()
            .join("|");
        Self(Regex::new(&alternation).expect("escaped phrases form a valid pattern"))
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

fn bounded(phrase: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let start = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let end = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    format!("{start}{}{end}", regex::escape(phrase))
}

static CONFUSION: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "confused",
        "confusing",
        "don't understand",
        "do not understand",
        "don't get",
        "doesn't make sense",
        "does not make sense",
        "lost",
        "unclear",
        "what do you mean",
        "i'm not following",
        "not following",
        "makes no sense",
    ])
});

static EXAMPLE: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "example",
        "examples",
        "show me",
        "precedent",
        "precedents",
        "case study",
        "case studies",
        "reference project",
        "reference projects",
        "projects like",
        "similar project",
        "similar projects",
        "instances of",
    ])
});

static DESIGN_GUIDANCE: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "how should i",
        "how can i",
        "what should i",
        "how do i",
        "should i",
        "help me",
        "my design",
        "my project",
        "my layout",
        "my plan",
        "improve",
        "improving",
        "approach",
    ])
});

static KNOWLEDGE: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "what is",
        "what are",
        "what's",
        "best practice",
        "best practices",
        "how does",
        "how do ",
        "explain",
        "define",
        "definition",
        "tell me about",
        "principles of",
        "guideline",
        "guidelines",
        "standard",
        "standards",
        "requirements for",
        "why do",
        "why is",
    ])
});

static FEEDBACK: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "what do you think",
        "feedback",
        "review my",
        "critique",
        "evaluate",
        "is this good",
        "how does this look",
        "thoughts on",
        "does this work",
    ])
});

static OVERCONFIDENT: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "perfect",
        "flawless",
        "will work for everyone",
        "works for everyone",
        "can't fail",
        "cannot fail",
        "obviously",
        "nothing to improve",
        "no need to change",
        "best possible",
        "no flaws",
        "100%",
    ])
});

static UNCERTAIN: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "not sure",
        "unsure",
        "i guess",
        "maybe",
        "might",
        "i'm worried",
        "i am worried",
        "probably",
        "i don't know",
    ])
});

static CONFIDENT: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "i will",
        "i've decided",
        "i have decided",
        "definitely",
        "certainly",
        "i know",
        "i'm sure",
    ])
});

static EXPLORATION: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "what if",
        "i'm thinking",
        "i am thinking",
        "i want to explore",
        "considering",
        "idea",
        "ideas",
        "alternatively",
        "i wonder",
        "could i",
    ])
});

static TECHNICAL: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "code",
        "codes",
        "regulation",
        "regulations",
        "accessible",
        "accessibility",
        "egress",
        "structural",
        "load",
        "loads",
        "hvac",
        "dimension",
        "dimensions",
        "square feet",
        "clearance",
        "clearances",
        "fire",
        "span",
        "spans",
        "insulation",
        "ventilation",
        "daylight",
        "daylighting",
        "circulation",
        "acoustic",
        "acoustics",
        "thermal",
    ])
});

static PERSONAL_CONTEXT: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "my ",
        "i'm designing",
        "i am designing",
        "our project",
        "in mine",
        "for mine",
        "we are designing",
    ])
});

static REASONING: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&["because", "therefore", "so that", "which means", "in order to"])
});

// A negation only counts inside the clause that mentions the examples.
static NEGATIVE_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        \b(don'?t|do\ not|no|not)\s+(want|need|looking\ for|asking\ for|interested\ in)\s+(any\s+)?(more\s+)?(examples?|precedents?|case\ stud(y|ies))\b
        | \b(don'?t|do\ not|never|rather\ not|no\ need\ to)\s+([\w']+\s+){0,3}?(show|give|see|send|provide|list|share|get|use)\b[^,.;!?]*\b(examples?|precedents?|case\ stud(y|ies))\b
        | \brather\ not\b[^,.;!?]*\b(examples?|precedents?)\b
        | \bno\s+(more\s+)?examples?\b
        | \bno\ need\ for\s+(any\s+)?(more\s+)?examples?\b
        | \bwithout\s+(any\s+)?examples?\b
        | \bstop\s+(giving|showing|sending)\s+(me\s+)?examples?\b
        | \bskip\s+the\s+examples?\b
        ",
    )
    .expect("negative context pattern is valid")
});

static LOW_ENGAGEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(ok(ay)?|k|sure|yes|yeah|yep|no|nope|fine|idk|whatever|cool|maybe|alright|i guess|dunno)[.!]*$")
        .expect("low engagement pattern is valid")
});

/// Lowercases, straightens quotes and collapses whitespace.
pub fn normalize(utterance: &str) -> String {
    utterance
        .to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies `utterance` from phrase lists alone.
pub fn classify(utterance: &str, history: &[Turn]) -> Classification {
    let text = normalize(utterance);
    let word_count = text.split_whitespace().count();
    let prior_learner_turns = history
        .iter()
        .filter(|turn| turn.role == TurnRole::Learner)
        .count();

    let shows_confusion = CONFUSION.is_match(&text);
    let shows_negative_context = NEGATIVE_CONTEXT.is_match(&text);
    let is_example_request = EXAMPLE.is_match(&text);
    let guidance = DESIGN_GUIDANCE.is_match(&text);
    let knowledge = KNOWLEDGE.is_match(&text);
    let feedback = FEEDBACK.is_match(&text);
    let overconfident = OVERCONFIDENT.is_match(&text);
    let low_engagement = word_count == 0 || LOW_ENGAGEMENT.is_match(&text);
    let exploration = EXPLORATION.is_match(&text);
    let is_technical_question = TECHNICAL.is_match(&text) && (text.contains('?') || knowledge);
    let personal = PERSONAL_CONTEXT.is_match(&text) || guidance;

    let is_pure_knowledge_request =
        knowledge && !personal && !is_example_request && !shows_confusion && !feedback;

    let (interaction_type, confidence_score) = if shows_confusion {
        (InteractionType::ConfusionExpression, 0.85)
    } else if is_example_request && !shows_negative_context {
        (InteractionType::ExampleRequest, 0.8)
    } else if guidance {
        (InteractionType::DesignGuidance, 0.7)
    } else if knowledge {
        (InteractionType::KnowledgeSeeking, 0.75)
    } else if feedback {
        (InteractionType::FeedbackRequest, 0.75)
    } else if overconfident {
        (InteractionType::OverconfidentStatement, 0.7)
    } else if low_engagement {
        (InteractionType::LowEngagement, 0.65)
    } else if exploration {
        (InteractionType::DesignExploration, 0.6)
    } else if prior_learner_turns == 0 {
        (InteractionType::FirstMessage, 0.6)
    } else {
        (InteractionType::Other, 0.4)
    };

    let confidence_level = if overconfident {
        ConfidenceLevel::Overconfident
    } else if shows_confusion || UNCERTAIN.is_match(&text) {
        ConfidenceLevel::Uncertain
    } else if CONFIDENT.is_match(&text) {
        ConfidenceLevel::Confident
    } else {
        ConfidenceLevel::Neutral
    };

    let understanding_level = if shows_confusion {
        Level::Low
    } else if TECHNICAL.is_match(&text) && REASONING.is_match(&text) {
        Level::High
    } else {
        Level::Medium
    };

    let engagement_level = if low_engagement {
        Level::Low
    } else if word_count >= 20 || (exploration && text.contains('?')) {
        Level::High
    } else {
        Level::Medium
    };

    Classification {
        interaction_type,
        confidence_level,
        understanding_level,
        engagement_level,
        is_technical_question,
        is_example_request,
        is_pure_knowledge_request,
        shows_confusion,
        shows_negative_context,
        confidence_score,
        source: ClassificationSource::Heuristic,
    }
}
