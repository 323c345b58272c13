//! Repository layer: the catalog's transaction boundary.
//!
//! # Responsibility
//! - Define the project repository contract callers depend on.
//! - Keep SQL, transactions and constraint handling inside core persistence.
//!
//! # Invariants
//! - Each repository operation runs in exactly one store transaction.
//! - Store constraint violations surface as `RepoError` domain variants only
//!   where a known conflict exists (project name); everything else stays
//!   an opaque `RepoError::Db`.
//! - Shared technology rows are created on demand and never deleted.

pub mod association;
pub mod error;
pub mod project_repo;
pub mod technology_repo;

pub use error::{ErrorKind, RepoError, RepoResult};
pub use project_repo::{ProjectRepository, SqliteProjectRepository};
pub use technology_repo::{ResolvedTechnologies, TechnologyResolver};
