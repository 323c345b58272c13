//! Entity invariant errors and the technology version hook.

use chrono::NaiveDateTime;
use regex::Regex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Entity invariant violations, raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two versions of the same technology name on one project.
    DuplicateTechnology { name: String },
    /// `end_date` earlier than `start_date`.
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Version string rejected by the active `VersionRule`.
    InvalidTechnologyVersion { name: String, version: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTechnology { name } => {
                write!(f, "project technologies must be unique: `{name}` appears twice")
            }
            Self::InvalidDateRange { start, end } => write!(
                f,
                "invalid date range: start_date ({start}) cannot be after end_date ({end})"
            ),
            Self::InvalidTechnologyVersion { name, version } => {
                write!(f, "technology `{name}` has invalid version `{version}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Hook deciding which version strings a technology may carry.
pub trait VersionRule: Debug + Send + Sync {
    fn check(&self, name: &str, version: &str) -> Result<(), ValidationError>;
}

/// Accepts every version string.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyVersion;

impl VersionRule for AnyVersion {
    fn check(&self, _name: &str, _version: &str) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Requires every version string to match one regular expression.
#[derive(Debug, Clone)]
pub struct PatternVersionRule {
    pattern: Regex,
}

impl PatternVersionRule {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl VersionRule for PatternVersionRule {
    fn check(&self, name: &str, version: &str) -> Result<(), ValidationError> {
        if self.pattern.is_match(version) {
            return Ok(());
        }
        Err(ValidationError::InvalidTechnologyVersion {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AnyVersion, PatternVersionRule, ValidationError, VersionRule};

    #[test]
    fn any_version_accepts_free_text() {
        assert!(AnyVersion.check("Snowflake", "Enterprise").is_ok());
    }

    #[test]
    fn pattern_rule_reports_name_and_version() {
        let rule = PatternVersionRule::new(r"^\d+(\.\d+)*$").unwrap();
        assert!(rule.check("Python", "3.12").is_ok());

        let err = rule.check("Python", "latest").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidTechnologyVersion {
                name: "Python".to_string(),
                version: "latest".to_string(),
            }
        );
    }
}
