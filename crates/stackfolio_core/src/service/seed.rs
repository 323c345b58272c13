//! Batch seeding of the catalog from a JSON document.
//!
//! The document is an array of create-project records. Each record goes
//! through `ProjectService::create_project`, so each one commits or rolls
//! back on its own.

use crate::model::CreateProjectInput;
use crate::repo::{ProjectRepository, RepoError};
use crate::service::project_service::ProjectService;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Outcome counters for one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: usize,
    /// Records whose project name already existed.
    pub skipped: usize,
    pub failed: usize,
}

/// Failure that aborts a whole seeding run.
#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    /// The document is not a JSON array.
    Decode(serde_json::Error),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read seed file: {err}"),
            Self::Decode(err) => write!(f, "failed to decode seed JSON: {err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

/// Seeds from a JSON file.
pub fn seed_from_path<R: ProjectRepository>(
    service: &mut ProjectService<R>,
    path: impl AsRef<Path>,
) -> Result<SeedReport, SeedError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(SeedError::Io)?;
    info!(
        "event=seed_start module=seed status=start path={}",
        path.display()
    );
    seed_from_str(service, &raw)
}

/// Seeds from an in-memory JSON document.
pub fn seed_from_str<R: ProjectRepository>(
    service: &mut ProjectService<R>,
    raw: &str,
) -> Result<SeedReport, SeedError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(raw).map_err(|err| {
        error!("event=seed_decode module=seed status=error error={err}");
        SeedError::Decode(err)
    })?;

    let mut report = SeedReport::default();
    for record in records {
        let name = record
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let input: CreateProjectInput = match serde_json::from_value(record) {
            Ok(input) => input,
            Err(err) => {
                error!("event=seed_record module=seed status=error name={name} error={err}");
                report.failed += 1;
                continue;
            }
        };

        match service.create_project(&input) {
            Ok(_) => {
                info!("event=seed_record module=seed status=ok name={name}");
                report.created += 1;
            }
            Err(RepoError::ProjectNameAlreadyExists(_)) => {
                warn!("event=seed_record module=seed status=skipped name={name} reason=exists");
                report.skipped += 1;
            }
            Err(err) => {
                error!(
                    "event=seed_record module=seed status=error name={name} error_code={}",
                    err.kind().code()
                );
                report.failed += 1;
            }
        }
    }

    info!(
        "event=seed_finish module=seed status=ok created={} skipped={} failed={}",
        report.created, report.skipped, report.failed
    );
    Ok(report)
}
