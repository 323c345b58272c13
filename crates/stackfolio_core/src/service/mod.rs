//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep adapters (CLI, web) decoupled from storage details.

pub mod project_service;
pub mod seed;

pub use project_service::{ProjectPage, ProjectService};
pub use seed::{seed_from_path, seed_from_str, SeedError, SeedReport};
