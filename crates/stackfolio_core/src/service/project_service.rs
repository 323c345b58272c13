//! Project use-case service.
//!
//! # Responsibility
//! - Provide one entry point per catalog use case for adapters (CLI, web).
//! - Delegate every state change to the repository contract.
//!
//! # Invariants
//! - The service never bypasses repository transactions or validation.
//! - Failures are logged once here with their `ErrorKind` code.

use crate::model::input::DEFAULT_PAGE_LIMIT;
use crate::model::{
    CreateProjectInput, DeleteProjectInput, GetProjectInput, GetProjectsInput, Project,
    RemoveProjectTechnologiesInput, UpdateProjectInput, UpdateProjectTechnologiesInput,
};
use crate::repo::{ErrorKind, ProjectRepository, RepoResult};
use log::{error, warn};
use serde::Serialize;

/// One page of the project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<Project>,
    /// Offset of the following page.
    pub next_offset: u32,
}

/// Use-case facade over a project repository.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists projects; a zero `limit` falls back to the default page size.
    pub fn get_projects(&mut self, input: GetProjectsInput) -> RepoResult<ProjectPage> {
        let input = GetProjectsInput {
            limit: if input.limit == 0 {
                DEFAULT_PAGE_LIMIT
            } else {
                input.limit
            },
            offset: input.offset,
        };
        let projects = observe("project_list", self.repo.get_many(&input))?;
        Ok(ProjectPage {
            projects,
            next_offset: input.offset.saturating_add(input.limit),
        })
    }

    pub fn get_project(&mut self, input: GetProjectInput) -> RepoResult<Project> {
        observe("project_get", self.repo.get_by_id(&input))
    }

    pub fn create_project(&mut self, input: &CreateProjectInput) -> RepoResult<Project> {
        observe("project_create", self.repo.create(input))
    }

    pub fn update_project(&mut self, input: &UpdateProjectInput) -> RepoResult<Project> {
        observe("project_update", self.repo.update(input))
    }

    /// Merges technology versions by name into the project's set.
    pub fn update_project_technologies(
        &mut self,
        input: &UpdateProjectTechnologiesInput,
    ) -> RepoResult<Project> {
        observe(
            "project_technologies_merge",
            self.repo.update_technologies(input),
        )
    }

    /// Detaches technologies by name; unknown names are ignored.
    pub fn remove_project_technologies(
        &mut self,
        input: &RemoveProjectTechnologiesInput,
    ) -> RepoResult<Project> {
        observe(
            "project_technologies_remove",
            self.repo.remove_technologies(input),
        )
    }

    /// Returns whether a project row was actually removed.
    pub fn delete_project(&mut self, input: DeleteProjectInput) -> RepoResult<bool> {
        observe("project_delete", self.repo.delete(&input))
    }
}

fn observe<T>(event: &'static str, result: RepoResult<T>) -> RepoResult<T> {
    if let Err(err) = &result {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            error!(
                "event={event} module=service status=error error_code={} error={err}",
                kind.code()
            );
        } else {
            warn!(
                "event={event} module=service status=error error_code={}",
                kind.code()
            );
        }
    }
    result
}
