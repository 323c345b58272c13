//! Get-or-create resolution of shared technology rows.
//!
//! # Responsibility
//! - Map `(name, version)` pairs to persisted `TechnologyVersion` rows,
//!   creating missing `technology` / `technology_version` rows exactly once.
//!
//! # Invariants
//! - Inserts use `ON CONFLICT ... DO NOTHING` on the unique key, then re-read.
//!   Identifiers always come from the re-read, never from the insert, because
//!   a conflicting insert returns no row.
//! - Nothing here ever deletes a technology or technology-version row.
//! - No lookup is cached across calls.

use crate::model::{
    AnyVersion, Technology, TechnologyId, TechnologyInput, TechnologyVersion, VersionRule,
};
use crate::repo::association::ensure_distinct_inputs;
use crate::repo::error::{RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::HashMap;

/// Rows per multi-row statement, well below SQLite's bound-parameter limit.
pub(crate) const MAX_BATCH_ROWS: usize = 256;

/// Resolved technology versions keyed by technology name.
pub type ResolvedTechnologies = HashMap<String, TechnologyVersion>;

/// Resolves technology pairs inside the caller's transaction.
#[derive(Debug)]
pub struct TechnologyResolver {
    rule: Box<dyn VersionRule>,
}

impl Default for TechnologyResolver {
    fn default() -> Self {
        Self::new(AnyVersion)
    }
}

impl TechnologyResolver {
    pub fn new(rule: impl VersionRule + 'static) -> Self {
        Self {
            rule: Box::new(rule),
        }
    }

    /// Checks name distinctness and the version rule without touching the store.
    pub fn validate_inputs(&self, inputs: &[TechnologyInput]) -> RepoResult<()> {
        ensure_distinct_inputs(inputs)?;
        for input in inputs {
            self.rule.check(&input.name, &input.version)?;
        }
        Ok(())
    }

    /// Returns the persisted row for every input pair, creating missing rows.
    ///
    /// `conn` is expected to be inside a write transaction owned by the caller.
    pub fn resolve(
        &self,
        conn: &Connection,
        inputs: &[TechnologyInput],
    ) -> RepoResult<ResolvedTechnologies> {
        self.validate_inputs(inputs)?;
        self.resolve_validated(conn, inputs)
    }

    /// `resolve` without the input checks.
    ///
    /// Callers run `validate_inputs` on caller-submitted entries first; entries
    /// already attached to a project are resolved as stored, even when the
    /// current rule would reject them.
    pub(crate) fn resolve_validated(
        &self,
        conn: &Connection,
        inputs: &[TechnologyInput],
    ) -> RepoResult<ResolvedTechnologies> {
        if inputs.is_empty() {
            return Ok(HashMap::new());
        }

        let names: Vec<&str> = inputs.iter().map(|input| input.name.as_str()).collect();
        let technologies_inserted = insert_technologies(conn, &names)?;
        let technologies = load_technologies_by_name(conn, &names)?;

        let mut pairs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let technology_id = technologies
                .get(input.name.as_str())
                .and_then(|technology| technology.id)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "technology `{}` missing after insert",
                        input.name
                    ))
                })?;
            pairs.push((technology_id, input.version.as_str()));
        }

        let versions_inserted = insert_versions(conn, &pairs)?;
        let resolved = load_versions_by_pair(conn, &pairs)?;
        for input in inputs {
            let matches = resolved
                .get(input.name.as_str())
                .is_some_and(|record| record.version == input.version);
            if !matches {
                return Err(RepoError::InvalidData(format!(
                    "technology version `{}` `{}` missing after insert",
                    input.name, input.version
                )));
            }
        }

        debug!(
            "event=technology_resolve module=repo status=ok requested={} technologies_inserted={} versions_inserted={}",
            inputs.len(),
            technologies_inserted,
            versions_inserted
        );
        Ok(resolved)
    }
}

fn insert_technologies(conn: &Connection, names: &[&str]) -> RepoResult<usize> {
    let mut inserted = 0;
    for chunk in names.chunks(MAX_BATCH_ROWS) {
        let sql = format!(
            "INSERT INTO technology (name) VALUES {}
             ON CONFLICT (name) DO NOTHING;",
            placeholders(chunk.len(), 1)
        );
        inserted += conn.execute(&sql, params_from_iter(chunk.iter()))?;
    }
    Ok(inserted)
}

fn load_technologies_by_name(
    conn: &Connection,
    names: &[&str],
) -> RepoResult<HashMap<String, Technology>> {
    let mut technologies = HashMap::with_capacity(names.len());
    for chunk in names.chunks(MAX_BATCH_ROWS) {
        let sql = format!(
            "SELECT id, name, description
             FROM technology
             WHERE name IN ({});",
            vec!["?"; chunk.len()].join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let technology = Technology {
                id: Some(row.get("id")?),
                name: row.get("name")?,
                description: row.get("description")?,
            };
            technologies.insert(technology.name.clone(), technology);
        }
    }
    Ok(technologies)
}

fn insert_versions(conn: &Connection, pairs: &[(TechnologyId, &str)]) -> RepoResult<usize> {
    let mut inserted = 0;
    for chunk in pairs.chunks(MAX_BATCH_ROWS) {
        let sql = format!(
            "INSERT INTO technology_version (technology_id, version) VALUES {}
             ON CONFLICT (technology_id, version) DO NOTHING;",
            placeholders(chunk.len(), 2)
        );
        inserted += conn.execute(&sql, params_from_iter(pair_values(chunk)))?;
    }
    Ok(inserted)
}

fn load_versions_by_pair(
    conn: &Connection,
    pairs: &[(TechnologyId, &str)],
) -> RepoResult<ResolvedTechnologies> {
    let mut resolved = HashMap::with_capacity(pairs.len());
    for chunk in pairs.chunks(MAX_BATCH_ROWS) {
        let sql = format!(
            "SELECT
                tv.id AS version_id,
                tv.version,
                t.id AS technology_id,
                t.name,
                t.description
             FROM technology_version tv
             INNER JOIN technology t ON t.id = tv.technology_id
             WHERE (tv.technology_id, tv.version) IN (VALUES {});",
            placeholders(chunk.len(), 2)
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(pair_values(chunk)))?;
        while let Some(row) = rows.next()? {
            let record = parse_version_row(row)?;
            resolved.insert(record.technology.name.clone(), record);
        }
    }
    Ok(resolved)
}

/// Parses one `technology_version JOIN technology` row.
///
/// Expects the columns `version_id`, `version`, `technology_id`, `name`,
/// `description`.
pub(crate) fn parse_version_row(row: &Row<'_>) -> rusqlite::Result<TechnologyVersion> {
    Ok(TechnologyVersion {
        id: Some(row.get("version_id")?),
        technology: Technology {
            id: Some(row.get("technology_id")?),
            name: row.get("name")?,
            description: row.get("description")?,
        },
        version: row.get("version")?,
    })
}

fn pair_values(pairs: &[(TechnologyId, &str)]) -> Vec<Value> {
    pairs
        .iter()
        .flat_map(|(technology_id, version)| {
            [Value::Integer(*technology_id), Value::Text((*version).to_string())]
        })
        .collect()
}

/// `(?, ?), (?, ?)` for `rows` tuples of `width` parameters.
fn placeholders(rows: usize, width: usize) -> String {
    let tuple = format!("({})", vec!["?"; width].join(", "));
    vec![tuple; rows].join(", ")
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn placeholders_render_row_tuples() {
        assert_eq!(placeholders(1, 1), "(?)");
        assert_eq!(placeholders(2, 2), "(?, ?), (?, ?)");
    }
}
