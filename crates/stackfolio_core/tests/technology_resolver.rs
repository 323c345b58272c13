use rusqlite::{Connection, TransactionBehavior};
use stackfolio_core::db::{open_db, open_db_in_memory};
use stackfolio_core::{
    CreateProjectInput, ErrorKind, PatternVersionRule, ProjectRepository,
    SqliteProjectRepository, TechnologyInput, TechnologyResolver,
};
use std::collections::HashSet;
use std::thread;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn resolving_twice_returns_the_same_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let resolver = TechnologyResolver::default();
    let inputs = vec![
        TechnologyInput::new("Python", "3.12"),
        TechnologyInput::new("Postgres", "16"),
    ];

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    let first = resolver.resolve(&tx, &inputs).unwrap();
    let second = resolver.resolve(&tx, &inputs).unwrap();
    tx.commit().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    let python = &first["Python"];
    assert!(python.id.is_some());
    assert!(python.technology.id.is_some());
    assert_eq!(python.version, "3.12");
    assert_eq!(count(&conn, "technology"), 2);
    assert_eq!(count(&conn, "technology_version"), 2);
}

#[test]
fn new_versions_reuse_the_existing_technology_row() {
    let mut conn = open_db_in_memory().unwrap();
    let resolver = TechnologyResolver::default();

    let tx = conn.transaction().unwrap();
    let old = resolver
        .resolve(&tx, &[TechnologyInput::new("Python", "3.12")])
        .unwrap();
    let new = resolver
        .resolve(&tx, &[TechnologyInput::new("Python", "3.13")])
        .unwrap();
    tx.commit().unwrap();

    assert_eq!(old["Python"].technology.id, new["Python"].technology.id);
    assert_ne!(old["Python"].id, new["Python"].id);
    assert_eq!(count(&conn, "technology"), 1);
    assert_eq!(count(&conn, "technology_version"), 2);
}

#[test]
fn empty_input_touches_nothing() {
    let conn = open_db_in_memory().unwrap();
    let resolved = TechnologyResolver::default().resolve(&conn, &[]).unwrap();

    assert!(resolved.is_empty());
    assert_eq!(count(&conn, "technology"), 0);
}

#[test]
fn invalid_input_is_rejected_before_any_insert() {
    let conn = open_db_in_memory().unwrap();
    let resolver = TechnologyResolver::new(PatternVersionRule::new(r"^\d+$").unwrap());

    let err = resolver
        .resolve(
            &conn,
            &[
                TechnologyInput::new("Node", "22"),
                TechnologyInput::new("Deno", "v2"),
            ],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTechnologyVersionFormat);

    let err = TechnologyResolver::default()
        .resolve(
            &conn,
            &[
                TechnologyInput::new("Node", "20"),
                TechnologyInput::new("Node", "22"),
            ],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProjectDuplicateTechnology);

    assert_eq!(count(&conn, "technology"), 0);
}

#[test]
fn large_inputs_span_multiple_batches() {
    let mut conn = open_db_in_memory().unwrap();
    let inputs: Vec<TechnologyInput> = (0..600)
        .map(|idx| TechnologyInput::new(format!("lib-{idx:03}"), "1.0"))
        .collect();

    let tx = conn.transaction().unwrap();
    let resolved = TechnologyResolver::default().resolve(&tx, &inputs).unwrap();
    tx.commit().unwrap();

    assert_eq!(resolved.len(), 600);
    assert_eq!(count(&conn, "technology_version"), 600);
}

#[test]
fn concurrent_creates_share_one_row_per_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");
    drop(open_db(&path).unwrap());

    let workers: Vec<_> = (0..8)
        .map(|idx| {
            let path = path.clone();
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                let mut repo = SqliteProjectRepository::new(&mut conn);
                let input = CreateProjectInput::new(format!("project-{idx}")).with_technologies(
                    vec![
                        TechnologyInput::new("Python", "3.12"),
                        TechnologyInput::new("Postgres", "16"),
                    ],
                );
                let project = repo.create(&input).unwrap();
                project
                    .technologies
                    .iter()
                    .map(|entry| entry.id.unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut version_ids = HashSet::new();
    for worker in workers {
        version_ids.extend(worker.join().unwrap());
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(version_ids.len(), 2);
    assert_eq!(count(&conn, "project"), 8);
    assert_eq!(count(&conn, "technology"), 2);
    assert_eq!(count(&conn, "technology_version"), 2);
    assert_eq!(count(&conn, "project_technology_association"), 16);
}
