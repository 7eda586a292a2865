//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema of the files on disk and are
//! private to the infrastructure layer.
//!
//! ### Session Version History
//! - **1**: Initial schema (session model nested under `[session]`)

mod session;

pub use session::SessionDocument;
