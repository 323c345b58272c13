//! Operation input records, one per use case.
//!
//! Optional fields of create/update records are tri-state (`Patch`) so that
//! "not supplied" survives all the way to the repository.

use crate::model::patch::Patch;
use crate::model::project::ProjectId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default page size for project listing.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// One `(technology name, version)` pair submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechnologyInput {
    pub name: String,
    pub version: String,
}

impl TechnologyInput {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProjectsInput {
    #[serde(default = "default_page_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for GetProjectsInput {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProjectInput {
    pub project_id: ProjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProjectInput {
    pub project_id: ProjectId,
}

/// Create request. Absent fields are left out of the insert entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub technologies: Patch<Vec<TechnologyInput>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub start_date: Patch<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub end_date: Patch<NaiveDateTime>,
}

impl CreateProjectInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Patch::Absent,
            technologies: Patch::Absent,
            start_date: Patch::Absent,
            end_date: Patch::Absent,
        }
    }

    pub fn with_technologies(mut self, technologies: Vec<TechnologyInput>) -> Self {
        self.technologies = Patch::Value(technologies);
        self
    }
}

/// Partial update. Only supplied fields are written.
///
/// `name` stays tri-state here even though the store requires a value:
/// an explicit `Null` reaches the store's NOT NULL constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub technologies: Patch<Vec<TechnologyInput>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub start_date: Patch<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub end_date: Patch<NaiveDateTime>,
}

impl UpdateProjectInput {
    /// An update that supplies nothing.
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            name: Patch::Absent,
            description: Patch::Absent,
            technologies: Patch::Absent,
            start_date: Patch::Absent,
            end_date: Patch::Absent,
        }
    }
}

/// Merge-by-name request: supplied versions overwrite same-named entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProjectTechnologiesInput {
    pub project_id: ProjectId,
    pub technologies: Vec<TechnologyInput>,
}

/// Remove-by-name request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProjectTechnologiesInput {
    pub project_id: ProjectId,
    pub technologies: Vec<String>,
}
