//! The structured reply handed to the UI boundary.

use crate::challenge::ChallengePayload;
use crate::responder::{Citation, ResponderRole};
use crate::routing::Route;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final reply for one turn.
///
/// The engine makes no assumption about how it is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReply {
    pub text: String,
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_payload: Option<ChallengePayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    /// Roles whose output was missing from this reply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_roles: Vec<ResponderRole>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FinalReply {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_roles.is_empty()
    }

    /// Attaches a challenge that no responder delivered, appending its text.
    pub fn attach_challenge(&mut self, payload: ChallengePayload) {
        if self.challenge_payload.is_some() {
            return;
        }
        if !self.text.contains("Challenge:") {
            if !self.text.is_empty() {
                self.text.push_str("\n\n");
            }
            self.text.push_str("Challenge: ");
            self.text.push_str(&payload.render());
        }
        self.challenge_payload = Some(payload);
    }
}
