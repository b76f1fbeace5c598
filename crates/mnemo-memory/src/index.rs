//! FTS5 index over memory content.
//!
//! `memories_fts` is an external-content table: it stores only the inverted
//! index and reads column values back from `memories` by `seq`. Entries are
//! maintained explicitly by the store (insert after the record row, delete
//! before it) inside the same transaction as the record change.

use rusqlite::{Connection, params};

use crate::error::{MemoryError, Result};
use crate::record::Memory;

pub(crate) const CREATE_INDEX_SQL: &str = "CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    content, content=memories, content_rowid=seq
);";

/// Build a disjunctive FTS5 query from free text.
///
/// Non-word characters become separators, single-character tokens are
/// dropped, and each remaining token is quoted so FTS5 operators in user
/// text are treated literally. Returns `None` when no token survives.
pub fn build_match_query(query: &str) -> Option<String> {
    let normalized: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    let terms: Vec<String> = normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(|token| format!("\"{token}\""))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

pub(crate) fn insert_entry(conn: &Connection, seq: i64, content: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO memories_fts(rowid, content) VALUES (?1, ?2)",
        params![seq, content],
    )?;
    Ok(())
}

/// External-content deletes must supply the indexed text so FTS5 can
/// remove the exact tokens it stored.
pub(crate) fn delete_entry(conn: &Connection, seq: i64, content: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO memories_fts(memories_fts, rowid, content) VALUES ('delete', ?1, ?2)",
        params![seq, content],
    )?;
    Ok(())
}

/// Discard the index and re-derive it from the `memories` table.
pub(crate) fn rebuild(conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO memories_fts(memories_fts) VALUES ('rebuild')", [])?;
    Ok(())
}

/// BM25-ranked search. Engine failures are reported as
/// [`MemoryError::IndexCorrupt`] so callers can fall back to a scan; rows
/// that fail to decode surface as [`MemoryError::Storage`].
pub(crate) fn search(conn: &Connection, match_query: &str, limit: usize) -> Result<Vec<Memory>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.content, m.category, m.session_key, m.created_at, m.metadata
             FROM memories_fts f
             JOIN memories m ON m.seq = f.rowid
             WHERE memories_fts MATCH ?1
             ORDER BY f.rank
             LIMIT ?2",
        )
        .map_err(MemoryError::IndexCorrupt)?;
    let rows = stmt
        .query_map(params![match_query, limit], Memory::from_row)
        .map_err(MemoryError::IndexCorrupt)?;
    // Engine failures while stepping belong to the index; a row that fails
    // to decode is a record problem and would fail the fallback scan too.
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(..) => MemoryError::IndexCorrupt(error),
            other => MemoryError::Storage(other),
        })
}
