//! SQLite loader for the note graph cache.
//!
//! # Invariants
//! - Only rows with `is_deleted = 0` are loaded.
//! - Notes load first, then branches by `(parent_note_id, note_position)`,
//!   then attributes by `(note_id, position)`.

use crate::db::DbError;
use crate::graph::{GraphError, NoteGraph};
use crate::model::attribute::{Attribute, AttributeKind};
use crate::model::branch::Branch;
use crate::model::note::{Note, NoteType};
use log::{error, info};
use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const NOTE_SELECT_SQL: &str = "SELECT
    note_id,
    title,
    type,
    mime,
    content,
    is_deleted
FROM notes
WHERE is_deleted = 0
ORDER BY note_id ASC";

const BRANCH_SELECT_SQL: &str = "SELECT
    branch_id,
    note_id,
    parent_note_id,
    note_position,
    prefix,
    is_expanded,
    is_deleted
FROM branches
WHERE is_deleted = 0
ORDER BY parent_note_id ASC, note_position ASC, branch_id ASC";

const ATTRIBUTE_SELECT_SQL: &str = "SELECT
    attribute_id,
    note_id,
    type,
    name,
    value,
    position,
    is_inheritable,
    is_deleted
FROM attributes
WHERE is_deleted = 0
ORDER BY note_id ASC, position ASC, attribute_id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised while rebuilding the graph from storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted row holds a value the model cannot represent.
    InvalidData(String),
    /// Persisted rows violate a graph invariant (duplicate edge, cycle, ...).
    Graph(GraphError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted graph data: {message}"),
            Self::Graph(err) => write!(f, "persisted graph is inconsistent: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Graph(err) => Some(err),
        }
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

impl From<GraphError> for RepoError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    notes: usize,
    branches: usize,
    attributes: usize,
    skipped: usize,
}

/// Reads every live note, branch and attribute into a fresh graph.
///
/// Branches and attributes pointing at notes that are not loaded (deleted or
/// missing) are skipped and counted in the `graph_load` event.
///
/// # Errors
/// - `Db` on query failure.
/// - `InvalidData` on unknown type strings or non-boolean flags.
/// - `Graph` when rows form a duplicate edge or a cycle.
pub fn load_graph(conn: &Connection) -> RepoResult<NoteGraph> {
    let started_at = Instant::now();
    let mut stats = LoadStats::default();

    match load_into(conn, &mut stats) {
        Ok(graph) => {
            info!(
                "event=graph_load module=repo status=ok notes={} branches={} attributes={} skipped={} orphans={} duration_ms={}",
                stats.notes,
                stats.branches,
                stats.attributes,
                stats.skipped,
                graph.orphan_note_ids().len(),
                started_at.elapsed().as_millis()
            );
            Ok(graph)
        }
        Err(err) => {
            error!(
                "event=graph_load module=repo status=error notes={} branches={} attributes={} duration_ms={} error={}",
                stats.notes,
                stats.branches,
                stats.attributes,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn load_into(conn: &Connection, stats: &mut LoadStats) -> RepoResult<NoteGraph> {
    let mut graph = NoteGraph::new();

    let mut stmt = conn.prepare(NOTE_SELECT_SQL)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        graph.upsert_note(parse_note_row(row)?)?;
        stats.notes += 1;
    }

    let mut stmt = conn.prepare(BRANCH_SELECT_SQL)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let branch = parse_branch_row(row)?;
        if !graph.has_note(&branch.note_id) || !graph.has_note(&branch.parent_note_id) {
            stats.skipped += 1;
            continue;
        }
        graph.upsert_branch(branch)?;
        stats.branches += 1;
    }

    let mut stmt = conn.prepare(ATTRIBUTE_SELECT_SQL)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let attribute = parse_attribute_row(row)?;
        if !graph.has_note(&attribute.note_id) {
            stats.skipped += 1;
            continue;
        }
        graph.upsert_attribute(attribute)?;
        stats.attributes += 1;
    }

    Ok(graph)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let type_text: String = row.get("type")?;
    let kind = NoteType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid note type `{type_text}` in notes.type"))
    })?;

    Ok(Note {
        note_id: row.get("note_id")?,
        title: row.get("title")?,
        kind,
        mime: row.get("mime")?,
        content: row.get("content")?,
        is_deleted: parse_flag(row, "notes", "is_deleted")?,
    })
}

fn parse_branch_row(row: &Row<'_>) -> RepoResult<Branch> {
    Ok(Branch {
        branch_id: row.get("branch_id")?,
        note_id: row.get("note_id")?,
        parent_note_id: row.get("parent_note_id")?,
        note_position: row.get("note_position")?,
        prefix: row.get("prefix")?,
        is_expanded: parse_flag(row, "branches", "is_expanded")?,
        is_deleted: parse_flag(row, "branches", "is_deleted")?,
    })
}

fn parse_attribute_row(row: &Row<'_>) -> RepoResult<Attribute> {
    let type_text: String = row.get("type")?;
    let kind = AttributeKind::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid attribute type `{type_text}` in attributes.type"
        ))
    })?;

    Ok(Attribute {
        attribute_id: row.get("attribute_id")?,
        note_id: row.get("note_id")?,
        kind,
        name: row.get("name")?,
        value: row.get("value")?,
        position: row.get("position")?,
        is_inheritable: parse_flag(row, "attributes", "is_inheritable")?,
        is_deleted: parse_flag(row, "attributes", "is_deleted")?,
    })
}

fn parse_flag(row: &Row<'_>, table: &str, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in {table}.{column}"
        ))),
    }
}
