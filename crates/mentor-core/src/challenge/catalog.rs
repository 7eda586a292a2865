//! Gamified challenge payloads.
//!
//! Every family has a fixed template; only the subject (detected domain) and
//! the phase are substituted, so a payload is reproducible from its inputs.

use super::{ChallengeFamily, ChallengeTrigger};
use crate::context::DomainContext;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// A challenge the learner can play through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengePayload {
    pub family: ChallengeFamily,
    pub trigger: ChallengeTrigger,
    pub title: String,
    pub scenario: String,
    pub steps: Vec<String>,
    pub reward: String,
}

impl ChallengePayload {
    /// Plain-text rendering used when no responder phrased the challenge.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, self.scenario);
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        out.push_str(&format!("Reward: {}", self.reward));
        out
    }
}

/// Builds the payload for `family`.
pub fn build(
    family: ChallengeFamily,
    trigger: ChallengeTrigger,
    domain: &DomainContext,
    phase: Phase,
) -> ChallengePayload {
    let subject = domain.subject();
    let (title, scenario, steps, reward) = match family {
        ChallengeFamily::RolePlay => (
            "Role-Play: Walk In Their Shoes".to_string(),
            format!(
                "You are a first-time visitor arriving at {subject}. Stay in character for the whole exercise."
            ),
            vec![
                "Describe the first thing you see from the entrance.".to_string(),
                "Find your way to the main space and note every hesitation.".to_string(),
                "Name one change that would have made the journey easier.".to_string(),
            ],
            "Empathy badge: you designed from inside the experience.".to_string(),
        ),
        ChallengeFamily::Detective => (
            "Design Detective: The Missing Clue".to_string(),
            format!(
                "Something in {subject} is quietly failing its users. Your job is to find it before opening day."
            ),
            vec![
                "List three pieces of evidence from your current plan.".to_string(),
                "Name the suspect: which decision causes the problem?".to_string(),
                "Propose the fix and the test that would prove it.".to_string(),
            ],
            "Detective badge: case closed with evidence.".to_string(),
        ),
        ChallengeFamily::CreativeConstraint => (
            "Constraint Sprint".to_string(),
            format!(
                "Redesign one move in {subject} under a hard limit: half the budget and no new walls."
            ),
            vec![
                "Pick the single element you would keep at all costs.".to_string(),
                "Remove or combine two elements without losing the idea.".to_string(),
                "Explain what the constraint revealed about your priorities.".to_string(),
            ],
            "Inventor badge: more with less.".to_string(),
        ),
        ChallengeFamily::PerspectiveShift => (
            "Perspective Shift".to_string(),
            format!(
                "Look at {subject} through the eyes of someone very different from you: a wheelchair user, a child, or a night-shift worker."
            ),
            vec![
                "Choose one of those people and describe their arrival.".to_string(),
                "Identify where your design assumes they are like you.".to_string(),
                "Adjust one element so it works for them too.".to_string(),
            ],
            "Inclusive designer badge: one more viewpoint covered.".to_string(),
        ),
        ChallengeFamily::Storytelling => (
            "Story of a Day".to_string(),
            format!("Tell the story of one ordinary day in {subject}, from opening to closing."),
            vec![
                "Introduce the main character and why they came.".to_string(),
                "Describe the moment the building helps or hinders them.".to_string(),
                "End the story with what they remember on the way home.".to_string(),
            ],
            "Storyteller badge: your space has a narrative.".to_string(),
        ),
        ChallengeFamily::TimeTravel => (
            "Time Travel: Twenty Years Later".to_string(),
            format!("Jump twenty years ahead: {subject} is still standing, but its users have changed."),
            vec![
                "Describe who uses the space now and how.".to_string(),
                "Point to the part of your design that aged best.".to_string(),
                "Point to the part that needed the most change, and why.".to_string(),
            ],
            "Time traveller badge: designing for the long run.".to_string(),
        ),
        ChallengeFamily::Transformation => (
            "Transformation Challenge".to_string(),
            format!("For one season, {subject} must change use. Transform it without demolishing anything."),
            vec![
                "Pick the new use and its most demanding requirement.".to_string(),
                "Show which spaces adapt and which resist.".to_string(),
                "Decide what you would design differently from the start.".to_string(),
            ],
            "Shape-shifter badge: flexibility tested.".to_string(),
        ),
        ChallengeFamily::GenericReflection => (
            "Reflection Checkpoint".to_string(),
            format!("Pause on {subject} and test your own reasoning."),
            vec![
                "State your strongest design decision in one sentence.".to_string(),
                "Argue against it as convincingly as you can.".to_string(),
                "Decide whether it survives, and what you learned.".to_string(),
            ],
            "Reflective practitioner badge: decision stress-tested.".to_string(),
        ),
    };

    ChallengePayload {
        family,
        trigger,
        title,
        scenario: format!("{scenario} (Phase: {phase})"),
        steps,
        reward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_family_has_steps() {
        let domain = DomainContext::detect("a school", &[]);
        for family in ChallengeFamily::iter() {
            let payload = build(family, ChallengeTrigger::EngagementBoost, &domain, Phase::Discovery);
            assert_eq!(payload.family, family);
            assert_eq!(payload.steps.len(), 3);
            assert!(!payload.title.is_empty());
            assert!(payload.scenario.contains("school"));
        }
    }

    #[test]
    fn test_payload_is_deterministic() {
        let domain = DomainContext::default();
        let a = build(ChallengeFamily::Detective, ChallengeTrigger::LowEngagement, &domain, Phase::Synthesis);
        let b = build(ChallengeFamily::Detective, ChallengeTrigger::LowEngagement, &domain, Phase::Synthesis);
        assert_eq!(a, b);
        assert!(a.render().contains("1. List three pieces"));
    }
}
