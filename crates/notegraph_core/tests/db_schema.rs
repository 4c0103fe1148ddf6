use notegraph_core::db::schema::{stamped_version, SCHEMA_VERSION};
use notegraph_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_graph_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(stamped_version(&conn).unwrap(), SCHEMA_VERSION);
    for table in ["notes", "branches", "attributes"] {
        assert_table_exists(&conn, table);
    }
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_a_file_database_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notegraph.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO notes (note_id, title) VALUES ('root', 'root');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(stamped_version(&second).unwrap(), SCHEMA_VERSION);
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn schema_rejects_self_parenting_branches_and_bad_flags() {
    let conn = open_db_in_memory().unwrap();

    let self_parent = conn.execute(
        "INSERT INTO branches (branch_id, note_id, parent_note_id) VALUES ('b', 'n', 'n');",
        [],
    );
    assert!(self_parent.is_err());

    let bad_flag = conn.execute(
        "INSERT INTO notes (note_id, title, is_deleted) VALUES ('n', 'N', 2);",
        [],
    );
    assert!(bad_flag.is_err());
}

#[test]
fn foreign_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaVersionMismatch { found, expected } => {
            assert_eq!(found, 999);
            assert_eq!(expected, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
