//! Static route → responder roles table.

use mentor_core::responder::ResponderRole::{self, Cognitive, Knowledge, Socratic, Synthesis};
use mentor_core::routing::Route;

/// Roles consulted for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePlan {
    /// Always attempted.
    pub required: &'static [ResponderRole],
    /// Attempted only when their estimated latency fits the turn budget.
    pub optional: &'static [ResponderRole],
}

impl RoutePlan {
    const fn new(required: &'static [ResponderRole], optional: &'static [ResponderRole]) -> Self {
        Self { required, optional }
    }

    pub fn for_route(route: Route) -> Self {
        match route {
            Route::KnowledgeOnly | Route::ExampleRequest => Self::new(&[Knowledge], &[]),
            Route::SocraticClarification => Self::new(&[Socratic], &[]),
            Route::SocraticExploration | Route::SupportiveScaffolding | Route::ProgressiveOpening => {
                Self::new(&[Socratic], &[Knowledge])
            }
            Route::FoundationalBuilding | Route::BalancedGuidance => {
                Self::new(&[Knowledge, Socratic], &[])
            }
            Route::CognitiveChallenge | Route::CognitiveIntervention => {
                Self::new(&[Cognitive], &[Socratic])
            }
            Route::KnowledgeWithChallenge => Self::new(&[Knowledge, Socratic], &[Cognitive]),
            Route::MultiAgentComprehensive => {
                Self::new(&[Knowledge, Socratic, Cognitive], &[Synthesis])
            }
        }
    }

    pub fn is_required(&self, role: ResponderRole) -> bool {
        self.required.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_route_requires_a_role() {
        for route in Route::iter() {
            let plan = RoutePlan::for_route(route);
            assert!(!plan.required.is_empty(), "{route}");
            assert!(plan.optional.iter().all(|r| !plan.is_required(*r)), "{route}");
        }
    }

    #[test]
    fn test_challenge_routes_lead_with_cognitive() {
        assert_eq!(
            RoutePlan::for_route(Route::CognitiveChallenge).required,
            &[Cognitive]
        );
        assert_eq!(
            RoutePlan::for_route(Route::MultiAgentComprehensive).optional,
            &[Synthesis]
        );
    }
}
