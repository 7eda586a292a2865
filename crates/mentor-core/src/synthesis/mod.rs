//! Response Synthesizer.
//!
//! Merges whatever responder outputs arrived into one [`FinalReply`] using a
//! route-specific template. Contributions are ordered by [`ResponderRole`],
//! never by arrival, so the same inputs always give byte-identical text.
//! A failed role only removes its own section.

mod templates;
pub mod text;

use crate::classification::Classification;
use crate::config::SynthesisConfig;
use crate::reply::FinalReply;
use crate::responder::{Citation, ResponderOutput, ResponderRole};
use crate::routing::Route;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};

/// Shaping template selected from the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateId {
    Technical,
    Examples,
    Clarification,
    Challenge,
    MultiAgent,
    Guidance,
    Opening,
}

impl TemplateId {
    pub fn for_route(route: Route) -> Self {
        match route {
            Route::KnowledgeOnly | Route::FoundationalBuilding => TemplateId::Technical,
            Route::ExampleRequest => TemplateId::Examples,
            Route::SocraticClarification | Route::SupportiveScaffolding => TemplateId::Clarification,
            Route::CognitiveChallenge | Route::CognitiveIntervention => TemplateId::Challenge,
            Route::MultiAgentComprehensive => TemplateId::MultiAgent,
            Route::BalancedGuidance | Route::SocraticExploration | Route::KnowledgeWithChallenge => {
                TemplateId::Guidance
            }
            Route::ProgressiveOpening => TemplateId::Opening,
        }
    }
}

/// Usable outputs of one turn, looked up by role.
pub(crate) struct Contributions<'a> {
    outputs: &'a BTreeMap<ResponderRole, ResponderOutput>,
}

impl<'a> Contributions<'a> {
    pub(crate) fn get(&self, role: ResponderRole) -> Option<&'a str> {
        self.outputs
            .get(&role)
            .filter(|o| o.is_usable())
            .map(|o| o.text.trim())
    }

    pub(crate) fn citations(&self, role: ResponderRole) -> &'a [Citation] {
        self.outputs
            .get(&role)
            .filter(|o| o.is_usable())
            .map(|o| o.citations.as_slice())
            .unwrap_or_default()
    }

    fn any_usable(&self) -> bool {
        self.outputs.values().any(ResponderOutput::is_usable)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Shapes the reply for `route`.
    ///
    /// `turn_count` is the number of learner turns including the current one.
    pub fn synthesize(
        &self,
        route: Route,
        outputs: &BTreeMap<ResponderRole, ResponderOutput>,
        classification: &Classification,
        turn_count: u32,
    ) -> FinalReply {
        let template = TemplateId::for_route(route);
        let contributions = Contributions { outputs };

        let text = if contributions.any_usable() {
            templates::render(
                template,
                &contributions,
                classification,
                turn_count,
                &self.config,
            )
        } else {
            None
        };
        let used_fallback = text.is_none();
        let text = text.unwrap_or_else(|| templates::fallback(template).to_string());

        let degraded_roles: Vec<ResponderRole> = outputs
            .values()
            .filter(|o| !o.is_usable())
            .map(|o| o.role)
            .collect();

        let mut citations: Vec<Citation> = Vec::new();
        for role in outputs.keys() {
            for citation in contributions.citations(*role) {
                if !citations.iter().any(|c| c.title == citation.title) {
                    citations.push(citation.clone());
                }
            }
        }

        let challenge_payload = contributions
            .get(ResponderRole::Cognitive)
            .and_then(|_| outputs.get(&ResponderRole::Cognitive))
            .and_then(|o| o.challenge.clone());

        let mut metadata = BTreeMap::new();
        metadata.insert("template".to_string(), template.to_string().into());
        if used_fallback {
            metadata.insert("fallback_text".to_string(), true.into());
        }
        if !degraded_roles.is_empty() {
            metadata.insert(
                "degraded_roles".to_string(),
                degraded_roles
                    .iter()
                    .map(|r| serde_json::Value::from(r.to_string()))
                    .collect::<Vec<_>>()
                    .into(),
            );
            tracing::debug!(
                target: "mentor::synthesis",
                route = %route,
                degraded = ?degraded_roles,
                "Reply built without some roles"
            );
        }

        FinalReply {
            text,
            route,
            challenge_payload,
            citations,
            degraded_roles,
            metadata,
        }
    }
}
