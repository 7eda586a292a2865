//! Filesystem side of MENTOR: config file layering, well-known paths and
//! the TOML session repository.

pub mod config_loader;
mod dto;
pub mod paths;
pub mod storage;
pub mod toml_session_repository;

pub use crate::config_loader::ConfigLoader;
pub use crate::paths::{MentorPaths, PathError};
pub use crate::toml_session_repository::TomlSessionRepository;
