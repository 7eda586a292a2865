//! Per-session record of fired challenges.

use super::ChallengeFamily;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Reason a challenge candidate was suppressed instead of firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuppressionReason {
    /// Some challenge already fired on the immediately preceding learner turn.
    PrecedingTurn,
    /// The same family fired for the same context within the cooldown window.
    FamilyWindow,
}

/// Last firing of one (family, context hash) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub family: ChallengeFamily,
    pub context_hash: String,
    /// Learner turn (1-based) on which the family last fired.
    pub last_fired_turn: u32,
    pub fire_count: u32,
}

/// Rolling cooldown ledger.
///
/// Entries are created on first fire, updated on every later fire, and never
/// removed while the session lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CooldownLedger {
    #[serde(default)]
    entries: Vec<CooldownEntry>,
    /// Learner turn of the most recent fire of any family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_fired_turn: Option<u32>,
}

impl CooldownLedger {
    pub fn entries(&self) -> &[CooldownEntry] {
        &self.entries
    }

    pub fn last_fired_turn(&self) -> Option<u32> {
        self.last_fired_turn
    }

    pub fn entry(&self, family: ChallengeFamily, context_hash: &str) -> Option<&CooldownEntry> {
        self.entries
            .iter()
            .find(|e| e.family == family && e.context_hash == context_hash)
    }

    /// Returns the suppression reason if `family` may not fire on `turn`.
    ///
    /// `window` is measured in learner turns: a family that fired on turn `t`
    /// is blocked for the same context until turn `t + window`.
    pub fn check(
        &self,
        family: ChallengeFamily,
        context_hash: &str,
        turn: u32,
        window: u32,
    ) -> Option<SuppressionReason> {
        if let Some(last) = self.last_fired_turn {
            if turn.saturating_sub(last) <= 1 {
                return Some(SuppressionReason::PrecedingTurn);
            }
        }

        if let Some(entry) = self.entry(family, context_hash) {
            if turn.saturating_sub(entry.last_fired_turn) < window {
                return Some(SuppressionReason::FamilyWindow);
            }
        }

        None
    }

    /// Records that `family` fired on `turn` for `context_hash`.
    pub fn record_fire(&mut self, family: ChallengeFamily, context_hash: &str, turn: u32) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.family == family && e.context_hash == context_hash)
        {
            Some(entry) => {
                entry.last_fired_turn = turn;
                entry.fire_count += 1;
            }
            None => self.entries.push(CooldownEntry {
                family,
                context_hash: context_hash.to_string(),
                last_fired_turn: turn,
                fire_count: 1,
            }),
        }
        self.last_fired_turn = Some(self.last_fired_turn.map_or(turn, |t| t.max(turn)));
    }

    /// Rejects entries that point past the number of recorded learner turns.
    pub fn validate(&self, learner_turns: u32) -> Result<(), String> {
        if let Some(last) = self.last_fired_turn {
            if last > learner_turns {
                return Err(format!(
                    "cooldown ledger fired on turn {last} but only {learner_turns} learner turns exist"
                ));
            }
        }
        for entry in &self.entries {
            if entry.last_fired_turn == 0 || entry.last_fired_turn > learner_turns {
                return Err(format!(
                    "cooldown entry for {} points to turn {}",
                    entry.family, entry.last_fired_turn
                ));
            }
            if entry.fire_count == 0 {
                return Err(format!("cooldown entry for {} has zero fires", entry.family));
            }
        }
        let expected = self.entries.iter().map(|e| e.last_fired_turn).max();
        if expected != self.last_fired_turn {
            return Err("cooldown ledger last fire does not match its entries".to_string());
        }
        Ok(())
    }
}
