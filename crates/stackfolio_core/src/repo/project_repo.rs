//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Run every catalog operation inside exactly one SQLite transaction.
//! - Apply the association engine and resolver to the project's technology set.
//! - Translate the project name uniqueness violation into a domain error.
//!
//! # Invariants
//! - Writes open `IMMEDIATE` transactions; a dropped transaction rolls back.
//! - Entity invariants are checked before the first write and again on the
//!   read-back that produces the returned entity.
//! - Only `project` and `project_technology_association` rows are ever
//!   updated or deleted here.

use crate::model::project::check_date_range;
use crate::model::{
    CreateProjectInput, DeleteProjectInput, GetProjectInput, GetProjectsInput, Patch, Project,
    ProjectId, RemoveProjectTechnologiesInput, TechnologyInput, TechnologyVersion,
    TechnologyVersionId, UpdateProjectInput, UpdateProjectTechnologiesInput, VersionRule,
};
use crate::repo::association::{merge_by_name, remove_by_name, replacement};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::technology_repo::{parse_version_row, TechnologyResolver, MAX_BATCH_ROWS};
use log::info;
use rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE;
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    start_date,
    end_date
FROM project";

/// Fragment of SQLite's message for a `project.name` unique violation.
const PROJECT_NAME_CONSTRAINT: &str = "project.name";

/// Repository interface for project catalog operations.
///
/// Every method is one atomic unit: it either fully applies or leaves the
/// store untouched.
pub trait ProjectRepository {
    /// Lists one page of projects with their full technology graph.
    fn get_many(&mut self, input: &GetProjectsInput) -> RepoResult<Vec<Project>>;
    /// Loads one project or fails with `ProjectNotFound`.
    fn get_by_id(&mut self, input: &GetProjectInput) -> RepoResult<Project>;
    /// Inserts a project from supplied fields and attaches its technologies.
    fn create(&mut self, input: &CreateProjectInput) -> RepoResult<Project>;
    /// Applies supplied scalar fields and the replace policy for technologies.
    fn update(&mut self, input: &UpdateProjectInput) -> RepoResult<Project>;
    /// Merges technology versions by name.
    fn update_technologies(
        &mut self,
        input: &UpdateProjectTechnologiesInput,
    ) -> RepoResult<Project>;
    /// Detaches technologies by name.
    fn remove_technologies(
        &mut self,
        input: &RemoveProjectTechnologiesInput,
    ) -> RepoResult<Project>;
    /// Deletes a project; `false` when it did not exist.
    fn delete(&mut self, input: &DeleteProjectInput) -> RepoResult<bool>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn mut Connection,
    resolver: TechnologyResolver,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates a repository over a bootstrapped connection, accepting any version string.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self {
            conn,
            resolver: TechnologyResolver::default(),
        }
    }

    /// Replaces the technology version rule.
    pub fn with_version_rule(mut self, rule: impl VersionRule + 'static) -> Self {
        self.resolver = TechnologyResolver::new(rule);
        self
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn get_many(&mut self, input: &GetProjectsInput) -> RepoResult<Vec<Project>> {
        let tx = self.conn.transaction()?;
        let mut projects = {
            let mut stmt = tx.prepare(&format!(
                "{PROJECT_SELECT_SQL}
                 ORDER BY id ASC
                 LIMIT ?1 OFFSET ?2;"
            ))?;
            let mut rows = stmt.query(params![input.limit, input.offset])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                projects.push(parse_project_row(row)?);
            }
            projects
        };

        let ids: Vec<ProjectId> = projects.iter().filter_map(|project| project.id).collect();
        let mut technologies = load_project_technologies(&tx, &ids)?;
        for project in &mut projects {
            if let Some(entries) = project.id.and_then(|id| technologies.remove(&id)) {
                project.technologies = entries;
            }
            ensure_persisted_valid(project)?;
        }
        tx.commit()?;

        Ok(projects)
    }

    fn get_by_id(&mut self, input: &GetProjectInput) -> RepoResult<Project> {
        let tx = self.conn.transaction()?;
        let project = fetch_project(&tx, input.project_id)?;
        tx.commit()?;
        Ok(project)
    }

    fn create(&mut self, input: &CreateProjectInput) -> RepoResult<Project> {
        check_date_range(patch_value(&input.start_date), patch_value(&input.end_date))?;
        let technologies = replacement(&input.technologies).unwrap_or_default();
        self.resolver.validate_inputs(technologies)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let description = input.description.as_ref().into_supplied();
        let start_date = input.start_date.as_ref().into_supplied();
        let end_date = input.end_date.as_ref().into_supplied();
        let mut columns = SuppliedColumns::default();
        columns.push("name", &input.name);
        columns.push_supplied("description", description.as_ref());
        columns.push_supplied("start_date", start_date.as_ref());
        columns.push_supplied("end_date", end_date.as_ref());

        tx.execute(&columns.insert_sql("project"), columns.values())
            .map_err(|err| map_name_conflict(err, &input.name))?;
        let project_id = tx.last_insert_rowid();

        if !technologies.is_empty() {
            attach_resolved(&tx, &self.resolver, project_id, technologies)?;
        }

        let project = fetch_project(&tx, project_id)?;
        tx.commit()?;

        info!(
            "event=project_create module=repo status=ok project_id={} technologies={}",
            project_id,
            project.technologies.len()
        );
        Ok(project)
    }

    fn update(&mut self, input: &UpdateProjectInput) -> RepoResult<Project> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = fetch_project(&tx, input.project_id)?;

        check_date_range(
            input.start_date.resolve(current.start_date.as_ref()).copied(),
            input.end_date.resolve(current.end_date.as_ref()).copied(),
        )?;
        let technologies = replacement(&input.technologies);
        if let Some(list) = technologies {
            self.resolver.validate_inputs(list)?;
        }

        let name = input.name.as_ref().into_supplied();
        let description = input.description.as_ref().into_supplied();
        let start_date = input.start_date.as_ref().into_supplied();
        let end_date = input.end_date.as_ref().into_supplied();
        let mut columns = SuppliedColumns::default();
        columns.push_supplied("name", name.as_ref());
        columns.push_supplied("description", description.as_ref());
        columns.push_supplied("start_date", start_date.as_ref());
        columns.push_supplied("end_date", end_date.as_ref());

        if !columns.is_empty() {
            let conflicting_name = match &input.name {
                Patch::Value(name) => name.as_str(),
                Patch::Absent | Patch::Null => current.name.as_str(),
            };
            let sql = columns.update_sql("project", input.project_id);
            tx.execute(&sql, columns.values())
                .map_err(|err| map_name_conflict(err, conflicting_name))?;
        }

        if let Some(list) = technologies {
            replace_associations(&tx, input.project_id, &[])?;
            if !list.is_empty() {
                attach_resolved(&tx, &self.resolver, input.project_id, list)?;
            }
        }

        let project = fetch_project(&tx, input.project_id)?;
        tx.commit()?;

        info!(
            "event=project_update module=repo status=ok project_id={} scalar_fields={} technologies_replaced={}",
            input.project_id,
            columns.len(),
            technologies.is_some()
        );
        Ok(project)
    }

    fn update_technologies(
        &mut self,
        input: &UpdateProjectTechnologiesInput,
    ) -> RepoResult<Project> {
        if input.technologies.is_empty() {
            return self.get_by_id(&GetProjectInput {
                project_id: input.project_id,
            });
        }
        self.resolver.validate_inputs(&input.technologies)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = fetch_project(&tx, input.project_id)?;
        let merged = merge_by_name(&current.technologies, &input.technologies);

        replace_associations(&tx, input.project_id, &[])?;
        attach_resolved(&tx, &self.resolver, input.project_id, &merged)?;

        let project = fetch_project(&tx, input.project_id)?;
        tx.commit()?;

        info!(
            "event=project_technologies_merge module=repo status=ok project_id={} requested={} technologies={}",
            input.project_id,
            input.technologies.len(),
            project.technologies.len()
        );
        Ok(project)
    }

    fn remove_technologies(
        &mut self,
        input: &RemoveProjectTechnologiesInput,
    ) -> RepoResult<Project> {
        if input.technologies.is_empty() {
            return self.get_by_id(&GetProjectInput {
                project_id: input.project_id,
            });
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = fetch_project(&tx, input.project_id)?;
        let before = current.technologies.len();
        let remaining = remove_by_name(current.technologies, &input.technologies);

        if remaining.len() != before {
            let ids = version_ids(&remaining)?;
            replace_associations(&tx, input.project_id, &ids)?;
        }

        let project = fetch_project(&tx, input.project_id)?;
        tx.commit()?;

        info!(
            "event=project_technologies_remove module=repo status=ok project_id={} removed={}",
            input.project_id,
            before - project.technologies.len()
        );
        Ok(project)
    }

    fn delete(&mut self, input: &DeleteProjectInput) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM project WHERE id = ?1;", [input.project_id])?;
        tx.commit()?;

        info!(
            "event=project_delete module=repo status=ok project_id={} deleted={}",
            input.project_id,
            changed > 0
        );
        Ok(changed > 0)
    }
}

/// Column/value pairs for the fields a caller actually supplied.
#[derive(Default)]
struct SuppliedColumns<'a> {
    names: Vec<&'static str>,
    values: Vec<&'a dyn ToSql>,
}

impl<'a> SuppliedColumns<'a> {
    fn push(&mut self, column: &'static str, value: &'a dyn ToSql) {
        self.names.push(column);
        self.values.push(value);
    }

    /// Skips the column when the field was absent; `Some(None)` writes NULL.
    fn push_supplied<T: ToSql + 'a>(
        &mut self,
        column: &'static str,
        value: Option<&'a Option<T>>,
    ) {
        if let Some(value) = value {
            self.push(column, value);
        }
    }

    fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn values(&self) -> &[&'a dyn ToSql] {
        &self.values
    }

    fn insert_sql(&self, table: &str) -> String {
        let placeholders: Vec<String> = (1..=self.names.len())
            .map(|idx| format!("?{idx}"))
            .collect();
        format!(
            "INSERT INTO {table} ({}) VALUES ({});",
            self.names.join(", "),
            placeholders.join(", ")
        )
    }

    /// The row id is inlined; it is an integer, never caller text.
    fn update_sql(&self, table: &str, id: i64) -> String {
        let assignments: Vec<String> = self
            .names
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
            .collect();
        format!(
            "UPDATE {table} SET {} WHERE id = {id};",
            assignments.join(", ")
        )
    }
}

fn patch_value<T: Copy>(patch: &Patch<T>) -> Option<T> {
    match patch {
        Patch::Value(value) => Some(*value),
        Patch::Absent | Patch::Null => None,
    }
}

/// Re-raises a `project.name` unique violation as a domain conflict.
fn map_name_conflict(err: rusqlite::Error, name: &str) -> RepoError {
    if is_unique_violation(&err, PROJECT_NAME_CONSTRAINT) {
        return RepoError::ProjectNameAlreadyExists(name.to_string());
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error, constraint: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.extended_code == SQLITE_CONSTRAINT_UNIQUE && message.contains(constraint)
    )
}

/// Links `technologies` to the project; callers have validated what they accepted.
fn attach_resolved(
    conn: &Connection,
    resolver: &TechnologyResolver,
    project_id: ProjectId,
    technologies: &[TechnologyInput],
) -> RepoResult<()> {
    let resolved = resolver.resolve_validated(conn, technologies)?;
    let mut ids = Vec::with_capacity(technologies.len());
    for input in technologies {
        let record = resolved.get(input.name.as_str()).ok_or_else(|| {
            RepoError::InvalidData(format!("technology `{}` was not resolved", input.name))
        })?;
        ids.push(record.id.ok_or_else(|| {
            RepoError::InvalidData(format!("technology `{}` has no id", input.name))
        })?);
    }
    insert_associations(conn, project_id, &ids)
}

/// Makes `version_ids` the complete association set of one project.
fn replace_associations(
    conn: &Connection,
    project_id: ProjectId,
    version_ids: &[TechnologyVersionId],
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM project_technology_association WHERE project_id = ?1;",
        [project_id],
    )?;
    insert_associations(conn, project_id, version_ids)
}

fn insert_associations(
    conn: &Connection,
    project_id: ProjectId,
    version_ids: &[TechnologyVersionId],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO project_technology_association (project_id, technology_version_id)
         VALUES (?1, ?2);",
    )?;
    for version_id in version_ids {
        stmt.execute(params![project_id, version_id])?;
    }
    Ok(())
}

fn version_ids(entries: &[TechnologyVersion]) -> RepoResult<Vec<TechnologyVersionId>> {
    entries
        .iter()
        .map(|entry| {
            entry.id.ok_or_else(|| {
                RepoError::InvalidData(format!("technology `{}` has no id", entry.name()))
            })
        })
        .collect()
}

fn fetch_project(conn: &Connection, project_id: ProjectId) -> RepoResult<Project> {
    let mut project = conn
        .query_row(
            &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
            [project_id],
            parse_project_row,
        )
        .optional()?
        .ok_or(RepoError::ProjectNotFound(project_id))?;

    let mut technologies = load_project_technologies(conn, &[project_id])?;
    project.technologies = technologies.remove(&project_id).unwrap_or_default();
    ensure_persisted_valid(&project)?;
    Ok(project)
}

fn load_project_technologies(
    conn: &Connection,
    project_ids: &[ProjectId],
) -> RepoResult<HashMap<ProjectId, Vec<TechnologyVersion>>> {
    let mut technologies: HashMap<ProjectId, Vec<TechnologyVersion>> = HashMap::new();
    if project_ids.is_empty() {
        return Ok(technologies);
    }

    for chunk in project_ids.chunks(MAX_BATCH_ROWS) {
        let sql = format!(
            "SELECT
                pta.project_id,
                tv.id AS version_id,
                tv.version,
                t.id AS technology_id,
                t.name,
                t.description
             FROM project_technology_association pta
             INNER JOIN technology_version tv ON tv.id = pta.technology_version_id
             INNER JOIN technology t ON t.id = tv.technology_id
             WHERE pta.project_id IN ({})
             ORDER BY pta.project_id ASC, t.name ASC;",
            vec!["?"; chunk.len()].join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let project_id: ProjectId = row.get("project_id")?;
            technologies
                .entry(project_id)
                .or_default()
                .push(parse_version_row(row)?);
        }
    }
    Ok(technologies)
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        technologies: Vec::new(),
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
    })
}

fn ensure_persisted_valid(project: &Project) -> RepoResult<()> {
    project.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "project {} violates invariants: {err}",
            project.id.unwrap_or_default()
        ))
    })
}
