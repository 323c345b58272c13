//! Shared technology dimension rows.
//!
//! Both records are created on first reference by any project and never
//! deleted by project operations.

use crate::model::validation::{ValidationError, VersionRule};
use serde::{Deserialize, Serialize};

pub type TechnologyId = i64;
pub type TechnologyVersionId = i64;

/// A named software/library/platform dimension, unique by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Technology {
    /// Store-assigned id. `None` until persisted.
    pub id: Option<TechnologyId>,
    pub name: String,
    pub description: Option<String>,
}

impl Technology {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
        }
    }
}

/// One version string of one technology, unique by `(technology, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechnologyVersion {
    /// Store-assigned id. `None` until persisted.
    pub id: Option<TechnologyVersionId>,
    pub technology: Technology,
    pub version: String,
}

impl TechnologyVersion {
    /// Builds a version record and runs `rule` against it.
    pub fn try_new(
        technology: Technology,
        version: impl Into<String>,
        rule: &dyn VersionRule,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            id: None,
            technology,
            version: version.into(),
        };
        record.validate(rule)?;
        Ok(record)
    }

    pub fn validate(&self, rule: &dyn VersionRule) -> Result<(), ValidationError> {
        rule.check(self.name(), &self.version)
    }

    /// Technology name, the identity key inside one project.
    pub fn name(&self) -> &str {
        &self.technology.name
    }
}
