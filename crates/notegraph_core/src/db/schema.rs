//! Graph schema bootstrap.
//!
//! The whole schema lives in `schema.sql` and carries a single version,
//! stamped into `PRAGMA user_version`. An unstamped database receives the
//! schema; a stamped one must carry exactly [`SCHEMA_VERSION`].

use super::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Version stamped into databases created by this crate.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the graph tables on an unstamped database.
///
/// # Errors
/// - `SchemaVersionMismatch` when the database carries another version.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    match stamped_version(conn)? {
        SCHEMA_VERSION => Ok(()),
        0 => create_schema(conn),
        found => Err(DbError::SchemaVersionMismatch {
            found,
            expected: SCHEMA_VERSION,
        }),
    }
}

/// Version currently stamped on `conn`; `0` when unstamped.
pub fn stamped_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

fn create_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    info!("event=db_schema module=db status=created version={SCHEMA_VERSION}");
    Ok(())
}
