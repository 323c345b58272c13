//! Domain error family shared by every catalog repository and service.

use crate::db::DbError;
use crate::model::{ProjectId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of one catalog operation.
///
/// `Db` and `InvalidData` are opaque infrastructure failures; every other
/// variant is a known domain condition.
#[derive(Debug)]
pub enum RepoError {
    /// An entity invariant was violated; nothing was written.
    Validation(ValidationError),
    ProjectNotFound(ProjectId),
    /// The project name uniqueness constraint rejected a create/update.
    ProjectNameAlreadyExists(String),
    Db(DbError),
    /// Persisted rows cannot be converted into valid entities.
    InvalidData(String),
}

/// Closed set of error kinds presentation adapters map to user-visible status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProjectNotFound,
    ProjectNameAlreadyExists,
    ProjectDuplicateTechnology,
    ProjectInvalidDateRange,
    InvalidTechnologyVersionFormat,
    Internal,
}

impl ErrorKind {
    /// Stable identifier used in log lines and adapter payloads.
    pub fn code(self) -> &'static str {
        match self {
            Self::ProjectNotFound => "project_not_found",
            Self::ProjectNameAlreadyExists => "project_name_already_exists",
            Self::ProjectDuplicateTechnology => "project_duplicate_technology",
            Self::ProjectInvalidDateRange => "project_invalid_date_range",
            Self::InvalidTechnologyVersionFormat => "invalid_technology_version_format",
            Self::Internal => "internal",
        }
    }

    /// Suggested HTTP status for web adapters.
    pub fn http_status(self) -> u16 {
        match self {
            Self::ProjectNotFound => 404,
            Self::ProjectNameAlreadyExists => 409,
            Self::ProjectDuplicateTechnology => 418,
            Self::ProjectInvalidDateRange => 422,
            Self::InvalidTechnologyVersionFormat => 400,
            Self::Internal => 500,
        }
    }
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(ValidationError::DuplicateTechnology { .. }) => {
                ErrorKind::ProjectDuplicateTechnology
            }
            Self::Validation(ValidationError::InvalidDateRange { .. }) => {
                ErrorKind::ProjectInvalidDateRange
            }
            Self::Validation(ValidationError::InvalidTechnologyVersion { .. }) => {
                ErrorKind::InvalidTechnologyVersionFormat
            }
            Self::ProjectNotFound(_) => ErrorKind::ProjectNotFound,
            Self::ProjectNameAlreadyExists(_) => ErrorKind::ProjectNameAlreadyExists,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project with id ({id}) not found"),
            Self::ProjectNameAlreadyExists(name) => {
                write!(f, "project with name ({name}) already exists")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ProjectNotFound(_) => None,
            Self::ProjectNameAlreadyExists(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RepoError};
    use crate::model::ValidationError;

    #[test]
    fn validation_errors_map_to_their_own_kinds() {
        let duplicate = RepoError::from(ValidationError::DuplicateTechnology {
            name: "Python".to_string(),
        });
        assert_eq!(duplicate.kind(), ErrorKind::ProjectDuplicateTechnology);
        assert_eq!(duplicate.kind().http_status(), 418);

        let version = RepoError::from(ValidationError::InvalidTechnologyVersion {
            name: "Python".to_string(),
            version: "x".to_string(),
        });
        assert_eq!(version.kind().code(), "invalid_technology_version_format");
    }

    #[test]
    fn store_failures_are_internal() {
        let err = RepoError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.kind().http_status(), 500);
    }

    #[test]
    fn name_conflict_message_carries_the_name() {
        let err = RepoError::ProjectNameAlreadyExists("Atlas".to_string());
        assert_eq!(err.kind(), ErrorKind::ProjectNameAlreadyExists);
        assert!(err.to_string().contains("Atlas"));
    }
}
