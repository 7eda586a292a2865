//! Domain core of the MENTOR tutoring engine.
//!
//! Everything here is free of network and filesystem I/O: the per-turn
//! pipeline pieces (classification, phase tracking, routing, challenge
//! escalation, response synthesis), the session model they operate on, and
//! the traits external collaborators are reached through.

pub mod challenge;
pub mod classification;
pub mod config;
pub mod context;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod phase;
pub mod reply;
pub mod responder;
pub mod routing;
pub mod session;
pub mod synthesis;

pub use error::{MentorError, Result};
