//! Core catalog logic for Stackfolio.
//! This crate is the single source of truth for project/technology invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::{
    AnyVersion, CreateProjectInput, DeleteProjectInput, GetProjectInput, GetProjectsInput, Patch,
    PatternVersionRule, Project, ProjectId, RemoveProjectTechnologiesInput, Technology,
    TechnologyInput, TechnologyVersion, UpdateProjectInput, UpdateProjectTechnologiesInput,
    ValidationError, VersionRule,
};
pub use repo::{
    ErrorKind, ProjectRepository, RepoError, RepoResult, SqliteProjectRepository,
    TechnologyResolver,
};
pub use service::{
    seed_from_path, seed_from_str, ProjectPage, ProjectService, SeedError, SeedReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
