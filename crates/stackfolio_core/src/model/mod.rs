//! Catalog domain model.
//!
//! # Responsibility
//! - Define the transport-independent entities returned by every read path.
//! - Define the operation input records consumed by use-case services.
//! - Own the entity invariants and the version validation hook.
//!
//! # Invariants
//! - A project never holds two versions of the same technology name.
//! - `end_date >= start_date` whenever both are set.
//! - Technology and technology-version rows are shared across projects and
//!   identified by `name` / `(technology, version)`.

pub mod input;
pub mod patch;
pub mod project;
pub mod technology;
pub mod validation;

pub use input::{
    CreateProjectInput, DeleteProjectInput, GetProjectInput, GetProjectsInput,
    RemoveProjectTechnologiesInput, TechnologyInput, UpdateProjectInput,
    UpdateProjectTechnologiesInput,
};
pub use patch::Patch;
pub use project::{Project, ProjectId};
pub use technology::{Technology, TechnologyId, TechnologyVersion, TechnologyVersionId};
pub use validation::{AnyVersion, PatternVersionRule, ValidationError, VersionRule};
