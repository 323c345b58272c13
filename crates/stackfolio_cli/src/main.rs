//! `stackfolio` command-line adapter.
//!
//! # Responsibility
//! - Resolve configuration from flags and `STACKFOLIO_*` environment variables.
//! - Translate subcommands into core use-case inputs and print JSON results.
//!
//! Domain failures exit with status 1 and their stable error code.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use stackfolio_core::db::open_db;
use stackfolio_core::{
    default_log_level, init_logging, seed_from_path, CreateProjectInput, DeleteProjectInput,
    GetProjectInput, GetProjectsInput, LogTarget, Patch, PatternVersionRule, ProjectId,
    ProjectService, RemoveProjectTechnologiesInput, RepoError, SqliteProjectRepository,
    TechnologyInput, UpdateProjectInput, UpdateProjectTechnologiesInput,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stackfolio",
    version,
    about = "Catalog of projects and the technology versions they use"
)]
struct Cli {
    /// SQLite catalog file.
    #[arg(long, env = "STACKFOLIO_DB", default_value = "stackfolio.sqlite3", global = true)]
    db: PathBuf,
    /// trace|debug|info|warn|error
    #[arg(long, env = "STACKFOLIO_LOG_LEVEL", global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    #[arg(long, env = "STACKFOLIO_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,
    /// Regular expression every technology version must match.
    #[arg(long, env = "STACKFOLIO_VERSION_PATTERN", global = true)]
    version_pattern: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create projects from a JSON array, skipping names that already exist.
    Seed {
        #[arg(default_value = "seed/projects.json")]
        path: PathBuf,
    },
    /// List one page of projects.
    List {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one project.
    Show { id: ProjectId },
    /// Create a project.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// NAME=VERSION, repeatable.
        #[arg(long = "tech", value_parser = parse_technology)]
        technologies: Vec<TechnologyInput>,
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,
    },
    /// Update supplied fields of a project.
    Update {
        id: ProjectId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        /// NAME=VERSION, repeatable. Replaces the whole technology set.
        #[arg(
            long = "tech",
            value_parser = parse_technology,
            conflicts_with = "clear_technologies"
        )]
        technologies: Vec<TechnologyInput>,
        #[arg(long)]
        clear_technologies: bool,
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,
    },
    /// Add or bump technology versions (merge by name).
    AddTech {
        id: ProjectId,
        /// NAME=VERSION
        #[arg(required = true, value_parser = parse_technology)]
        technologies: Vec<TechnologyInput>,
    },
    /// Detach technologies by name.
    RemoveTech {
        id: ProjectId,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete a project. Shared technology rows are kept.
    Delete { id: ProjectId },
}

#[derive(Debug, Serialize)]
struct DeleteOutcome {
    success: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RepoError>() {
                Some(repo_err) => {
                    eprintln!("error: {repo_err}");
                    eprintln!("code={}", repo_err.kind().code());
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
    let target = cli.log_dir.map_or(LogTarget::Stderr, LogTarget::Directory);
    init_logging(level, target).map_err(anyhow::Error::msg)?;
    debug!(
        "event=cli_start module=cli status=ok db={} version_pattern={}",
        cli.db.display(),
        cli.version_pattern.is_some()
    );

    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open catalog `{}`", cli.db.display()))?;
    let mut repo = SqliteProjectRepository::new(&mut conn);
    if let Some(pattern) = cli.version_pattern.as_deref() {
        let rule = PatternVersionRule::new(pattern)
            .with_context(|| format!("invalid version pattern `{pattern}`"))?;
        repo = repo.with_version_rule(rule);
    }
    let mut service = ProjectService::new(repo);

    match cli.command {
        Command::Seed { path } => {
            let report = seed_from_path(&mut service, &path)
                .with_context(|| format!("seeding from `{}` failed", path.display()))?;
            print_json(&report)
        }
        Command::List { limit, offset } => {
            print_json(&service.get_projects(GetProjectsInput { limit, offset })?)
        }
        Command::Show { id } => {
            print_json(&service.get_project(GetProjectInput { project_id: id })?)
        }
        Command::Create {
            name,
            description,
            technologies,
            start,
            end,
        } => {
            let input = CreateProjectInput {
                name,
                description: description.map_or(Patch::Absent, Patch::Value),
                technologies: if technologies.is_empty() {
                    Patch::Absent
                } else {
                    Patch::Value(technologies)
                },
                start_date: start.map_or(Patch::Absent, Patch::Value),
                end_date: end.map_or(Patch::Absent, Patch::Value),
            };
            print_json(&service.create_project(&input)?)
        }
        Command::Update {
            id,
            name,
            description,
            clear_description,
            technologies,
            clear_technologies,
            start,
            end,
        } => {
            let input = UpdateProjectInput {
                project_id: id,
                name: name.map_or(Patch::Absent, Patch::Value),
                description: match (description, clear_description) {
                    (Some(value), _) => Patch::Value(value),
                    (None, true) => Patch::Null,
                    (None, false) => Patch::Absent,
                },
                technologies: if clear_technologies {
                    Patch::Value(Vec::new())
                } else if technologies.is_empty() {
                    Patch::Absent
                } else {
                    Patch::Value(technologies)
                },
                start_date: start.map_or(Patch::Absent, Patch::Value),
                end_date: end.map_or(Patch::Absent, Patch::Value),
            };
            print_json(&service.update_project(&input)?)
        }
        Command::AddTech { id, technologies } => {
            let input = UpdateProjectTechnologiesInput {
                project_id: id,
                technologies,
            };
            print_json(&service.update_project_technologies(&input)?)
        }
        Command::RemoveTech { id, names } => {
            let input = RemoveProjectTechnologiesInput {
                project_id: id,
                technologies: names,
            };
            print_json(&service.remove_project_technologies(&input)?)
        }
        Command::Delete { id } => {
            let success = service.delete_project(DeleteProjectInput { project_id: id })?;
            print_json(&DeleteOutcome { success })
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_technology(raw: &str) -> Result<TechnologyInput, String> {
    let (name, version) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VERSION, got `{raw}`"))?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() {
        return Err(format!("expected NAME=VERSION, got `{raw}`"));
    }
    Ok(TechnologyInput::new(name, version))
}

/// Accepts `YYYY-MM-DDTHH:MM:SS[.f]` or a bare `YYYY-MM-DD` (midnight).
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(value) = raw.parse::<NaiveDateTime>() {
        return Ok(value);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("expected an ISO timestamp, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::{parse_technology, parse_timestamp, Cli};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_technology_splits_on_first_equals() {
        let parsed = parse_technology("Python=3.12").unwrap();
        assert_eq!(parsed.name, "Python");
        assert_eq!(parsed.version, "3.12");
        assert!(parse_technology("Python").is_err());
        assert!(parse_technology("=3.12").is_err());
    }

    #[test]
    fn parse_timestamp_accepts_dates_and_datetimes() {
        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.to_string(), "2024-03-01 00:00:00");
        let datetime = parse_timestamp("2024-03-01T12:30:00").unwrap();
        assert_eq!(datetime.to_string(), "2024-03-01 12:30:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
