//! Session domain module.
//!
//! A [`Session`] is the only mutable state of a conversation: its turns, the
//! phase tracker, the learner's skill tag and the challenge cooldown ledger.
//! It is owned by the orchestrating task for that conversation and is never
//! shared between conversations.
//!
//! # Module Structure
//!
//! - `model`: the `Session` aggregate and `SkillLevel`
//! - `message`: conversation turns (`TurnRole`, `Turn`)
//! - `repository`: repository trait for session persistence

mod message;
mod model;
mod repository;

pub use message::{Turn, TurnRole};
pub use model::{Session, SkillLevel};
pub use repository::SessionRepository;
