//! Relational companion database adapter.
//!
//! Projects ship a cross-reference row store next to the binary container.
//! The only interface this crate needs from it: for each table name, the
//! row count. Every open or query error is absorbed into an empty result;
//! a missing or corrupt companion file is an expected condition, never
//! fatal.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

/// Enumerate the tables of the companion database with their row counts.
///
/// Returns an empty list when the file is missing, unreadable, or not a
/// database.
pub fn table_row_counts(path: &Path) -> Vec<(String, i64)> {
    match read_tables(path) {
        Ok(tables) => tables,
        Err(e) => {
            debug!("xref database unavailable at {}: {e}", path.display());
            Vec::new()
        }
    }
}

fn read_tables(path: &Path) -> rusqlite::Result<Vec<(String, i64)>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let quoted = name.replace('"', "\"\"");
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM \"{quoted}\""), [], |row| {
                row.get(0)
            })?;
        tables.push((name, count));
    }
    Ok(tables)
}
