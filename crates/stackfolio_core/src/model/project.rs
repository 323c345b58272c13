//! Project aggregate.
//!
//! # Invariants
//! - Technology names attached to one project are pairwise distinct.
//! - `end_date >= start_date` when both are set.
//!
//! Repositories call `Project::validate()` before every write and after every
//! read; an invalid project is never persisted nor handed to callers.

use crate::model::technology::TechnologyVersion;
use crate::model::validation::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ProjectId = i64;

/// Catalog project with its technology-version set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Store-assigned id. `None` until persisted.
    pub id: Option<ProjectId>,
    /// Globally unique name.
    pub name: String,
    pub description: Option<String>,
    /// Set semantics; read paths order entries by technology name.
    pub technologies: Vec<TechnologyVersion>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

impl Project {
    /// Creates an unsaved project with no technologies and no dates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            technologies: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    /// Smart constructor for a fully populated project.
    pub fn try_new(
        name: impl Into<String>,
        description: Option<String>,
        technologies: Vec<TechnologyVersion>,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Self, ValidationError> {
        let project = Self {
            id: None,
            name: name.into(),
            description,
            technologies,
            start_date,
            end_date,
        };
        project.validate()?;
        Ok(project)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_date_range(self.start_date, self.end_date)?;
        check_unique_names(self.technologies.iter().map(TechnologyVersion::name))
    }
}

/// Rejects `end < start`. Open-ended ranges always pass.
pub fn check_date_range(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err(ValidationError::InvalidDateRange { start, end })
        }
        _ => Ok(()),
    }
}

/// Rejects the first technology name that appears twice.
pub fn check_unique_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateTechnology {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
