//! Domain context detection and context hashing.
//!
//! The context hash scopes challenge cooldowns: the same family may fire
//! again once the conversation has moved on to a different building type or
//! design phase.

use crate::classification::heuristic::{PhraseSet, normalize};
use crate::phase::Phase;
use crate::session::Turn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Domain label and the keywords that signal it.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("library", &["library", "libraries", "reading room"]),
    ("school", &["school", "schools", "classroom", "classrooms", "campus", "kindergarten"]),
    ("museum", &["museum", "museums", "gallery", "galleries", "exhibition"]),
    ("housing", &["housing", "apartment", "apartments", "residential", "dwelling", "dwellings"]),
    (
        "community_center",
        &["community center", "community centre", "community hub"],
    ),
    ("healthcare", &["hospital", "hospitals", "clinic", "clinics", "care home"]),
    ("office", &["office", "offices", "workplace", "coworking"]),
    ("pavilion", &["pavilion", "pavilions"]),
    ("market", &["market", "markets"]),
    (
        "adaptive_reuse",
        &["warehouse", "warehouses", "factory", "factories", "adaptive reuse"],
    ),
    ("landscape", &["landscape", "courtyard", "courtyards", "plaza", "plazas"]),
];

static DOMAIN_PATTERNS: Lazy<Vec<(&'static str, PhraseSet)>> = Lazy::new(|| {
    DOMAIN_KEYWORDS
        .iter()
        .map(|(label, keywords)| (*label, PhraseSet::new(keywords)))
        .collect()
});

/// Domains detected in the recent conversation, sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainContext {
    domains: BTreeSet<String>,
}

impl DomainContext {
    /// Scans the current utterance plus the given turns.
    pub fn detect(current: &str, recent: &[Turn]) -> Self {
        let mut domains = BTreeSet::new();
        let texts = std::iter::once(current).chain(recent.iter().map(|t| t.text.as_str()));
        for text in texts {
            let text = normalize(text);
            for (label, keywords) in DOMAIN_PATTERNS.iter() {
                if keywords.is_match(&text) {
                    domains.insert((*label).to_string());
                }
            }
        }
        Self { domains }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    /// The domain used to phrase prompts, if any.
    pub fn primary(&self) -> Option<&str> {
        self.labels().next()
    }

    /// Human-readable subject for generated text.
    pub fn subject(&self) -> String {
        match self.primary() {
            Some(label) => format!("your {}", label.replace('_', " ")),
            None => "your project".to_string(),
        }
    }
}

/// Fingerprint of (domain context, phase), as 16 hex digits.
///
/// Turn text is left out so the key stays the same while the learner keeps
/// talking about the same building in the same phase. The value is persisted
/// in cooldown ledgers and must not change between builds.
pub fn context_hash(domain: &DomainContext, phase: Phase) -> String {
    let mut hasher = Sha256::new();
    for label in domain.labels() {
        hasher.update(label.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(phase.as_ref().as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_from_history_and_current() {
        let history = vec![Turn::learner("I'm designing a small public library")];
        let ctx = DomainContext::detect("what about the courtyard?", &history);
        let labels: Vec<_> = ctx.labels().collect();
        assert_eq!(labels, vec!["landscape", "library"]);
        assert_eq!(ctx.primary(), Some("landscape"));
    }

    #[test]
    fn test_empty_context_subject() {
        let ctx = DomainContext::detect("hello", &[]);
        assert!(ctx.is_empty());
        assert_eq!(ctx.subject(), "your project");
    }

    #[test]
    fn test_hash_is_stable_and_scoped() {
        let a = DomainContext::detect("a museum wing", &[]);
        let b = DomainContext::detect("the Museum entrance", &[]);
        assert_eq!(
            context_hash(&a, Phase::Discovery),
            context_hash(&b, Phase::Discovery)
        );
        assert_ne!(
            context_hash(&a, Phase::Discovery),
            context_hash(&a, Phase::Exploration)
        );
        assert_eq!(context_hash(&a, Phase::Discovery).len(), 16);
    }

    #[test]
    fn test_hash_is_pinned_across_builds() {
        let ctx = DomainContext::detect("a museum wing", &[]);
        assert_eq!(context_hash(&ctx, Phase::Discovery), "4f0b9792b2294605");
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let ctx =
            DomainContext::detect("the supermarket officer asked about the librarything", &[]);
        assert!(ctx.is_empty());
        let ctx = DomainContext::detect("two schools and a market", &[]);
        assert_eq!(ctx.labels().collect::<Vec<_>>(), vec!["market", "school"]);
    }
}
