use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use mnemo_core::MemoryCategory;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};
use ulid::{Generator, Ulid};

use crate::error::{MemoryError, Result};
use crate::index;
use crate::record::{MEMORY_COLUMNS, Memory, Profile, format_timestamp};

const RECENT_LIMIT: usize = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// `seq` aliases the rowid so VACUUM cannot renumber rows under the index.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS memories (
    seq         INTEGER PRIMARY KEY,
    id          TEXT NOT NULL UNIQUE,
    content     TEXT NOT NULL,
    category    TEXT NOT NULL DEFAULT 'other',
    session_key TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_memories_category ON memories(category);
CREATE INDEX IF NOT EXISTS idx_memories_session ON memories(session_key);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);
";

/// SQLite-backed memory store with a synchronized FTS5 index.
///
/// One connection is shared behind a mutex, so writes are serialized and a
/// search never observes a half-written record. After [`close`](Self::close)
/// every operation fails with [`MemoryError::Closed`].
pub struct MemoryStore {
    path: PathBuf,
    state: Mutex<Option<StoreState>>,
}

struct StoreState {
    conn: Connection,
    ids: Generator,
    last_created_at: Option<DateTime<Utc>>,
}

impl MemoryStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |source: Box<dyn std::error::Error + Send + Sync>| {
            MemoryError::StorageUnavailable {
                path: path.clone(),
                source,
            }
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| unavailable(Box::new(err)))?;
        }

        let conn = Connection::open(&path).map_err(|err| unavailable(Box::new(err)))?;
        initialize(&conn).map_err(|err| unavailable(Box::new(err)))?;

        let last_created_at = conn
            .query_row("SELECT MAX(created_at) FROM memories", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .map_err(|err| unavailable(Box::new(err)))?
            .and_then(|raw| crate::record::parse_timestamp(&raw).ok());

        debug!(path = %path.display(), "Memory store opened");
        Ok(Self {
            path,
            state: Mutex::new(Some(StoreState {
                conn,
                ids: Generator::new(),
                last_created_at,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Persist a memory with empty metadata.
    pub fn create(
        &self,
        content: &str,
        category: MemoryCategory,
        session_key: &str,
    ) -> Result<Memory> {
        self.create_with_metadata(
            content,
            category,
            session_key,
            serde_json::Value::Object(serde_json::Map::new()),
        )
    }

    /// Persist a memory and index it in the same transaction, so it is
    /// searchable as soon as this returns.
    pub fn create_with_metadata(
        &self,
        content: &str,
        category: MemoryCategory,
        session_key: &str,
        metadata: serde_json::Value,
    ) -> Result<Memory> {
        if content.trim().is_empty() {
            return Err(MemoryError::InvalidInput(
                "memory content must not be empty".to_string(),
            ));
        }
        let metadata = if metadata.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            metadata
        };
        let metadata_json = serde_json::to_string(&metadata)?;

        self.with_state(|state| {
            let id = state.ids.generate().unwrap_or_else(|_| Ulid::new());
            let now = Utc::now().trunc_subsecs(6);
            let created_at = match state.last_created_at {
                Some(last) if last > now => last,
                _ => now,
            };

            let tx = state.conn.transaction()?;
            tx.execute(
                "INSERT INTO memories (id, content, category, session_key, created_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    content,
                    category.as_str(),
                    session_key,
                    format_timestamp(&created_at),
                    metadata_json,
                ],
            )?;
            let seq = tx.last_insert_rowid();
            index::insert_entry(&tx, seq, content)?;
            tx.commit()?;
            state.last_created_at = Some(created_at);

            let memory = Memory {
                id: id.to_string(),
                content: content.to_string(),
                category,
                session_key: session_key.to_string(),
                created_at,
                metadata,
            };
            debug!(
                memory_id = %memory.id,
                category = %memory.category,
                session_key,
                "Memory stored"
            );
            Ok(memory)
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Memory>> {
        self.with_state(|state| {
            let memory = state
                .conn
                .query_row(
                    &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"),
                    [id],
                    Memory::from_row,
                )
                .optional()?;
            Ok(memory)
        })
    }

    /// Relevance-ranked search.
    ///
    /// Blank queries and queries without a usable token return nothing. When
    /// the index query fails the store falls back to a case-insensitive
    /// substring scan, newest first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Memory>> {
        self.with_state(|state| {
            let query = query.trim();
            if query.is_empty() || limit == 0 {
                return Ok(Vec::new());
            }
            let Some(match_query) = index::build_match_query(query) else {
                return Ok(Vec::new());
            };

            match index::search(&state.conn, &match_query, limit) {
                Ok(results) => Ok(results),
                Err(MemoryError::IndexCorrupt(error)) => {
                    warn!(%error, query, "Full-text search failed; falling back to substring scan");
                    substring_search(&state.conn, query, limit)
                }
                Err(error) => Err(error),
            }
        })
    }

    /// Delete by exact id, or else every memory whose content contains
    /// `target` (case-insensitive). Returns how many were deleted.
    pub fn forget(&self, target: &str) -> Result<usize> {
        self.with_state(|state| {
            if target.trim().is_empty() {
                return Ok(0);
            }

            let tx = state.conn.transaction()?;
            let by_id = tx
                .query_row(
                    "SELECT seq, content FROM memories WHERE id = ?1",
                    [target],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            let matched_id = by_id.is_some();
            let victims = match by_id {
                Some(victim) => vec![victim],
                None => {
                    let needle = target.to_lowercase();
                    let mut stmt = tx.prepare("SELECT seq, content FROM memories")?;
                    let rows = stmt.query_map([], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                    })?;
                    let mut victims = Vec::new();
                    for row in rows {
                        let (seq, content) = row?;
                        if content.to_lowercase().contains(&needle) {
                            victims.push((seq, content));
                        }
                    }
                    victims
                }
            };

            for (seq, content) in &victims {
                index::delete_entry(&tx, *seq, content)?;
                tx.execute("DELETE FROM memories WHERE seq = ?1", [seq])?;
            }
            tx.commit()?;

            if !victims.is_empty() {
                info!(
                    deleted = victims.len(),
                    by_id = matched_id,
                    "Memories forgotten"
                );
            }
            Ok(victims.len())
        })
    }

    pub fn profile(&self) -> Result<Profile> {
        self.with_state(|state| {
            let conn = &state.conn;
            let mut by_category: BTreeMap<MemoryCategory, usize> = BTreeMap::new();
            {
                let mut stmt =
                    conn.prepare("SELECT category, COUNT(*) FROM memories GROUP BY category")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (raw, count) = row?;
                    let category = raw.parse().unwrap_or_else(|_| {
                        warn!(category = %raw, "unknown memory category; counting as other");
                        MemoryCategory::Other
                    });
                    *by_category.entry(category).or_default() += usize::try_from(count).unwrap_or(0);
                }
            }
            let total = by_category.values().sum();

            let db_size_bytes: i64 = conn.query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )?;

            let recent = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories ORDER BY created_at DESC, seq DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map([RECENT_LIMIT as i64], Memory::from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            Ok(Profile {
                total,
                by_category,
                db_size_bytes: u64::try_from(db_size_bytes).unwrap_or(0),
                recent,
            })
        })
    }

    /// Rebuild the full-text index from the record table.
    /// Returns the number of memories indexed.
    pub fn reindex(&self) -> Result<usize> {
        self.with_state(|state| {
            let tx = state.conn.transaction()?;
            index::rebuild(&tx)?;
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
            tx.commit()?;
            info!(indexed = count, "Memory index rebuilt");
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    /// Release the connection. Safe to call more than once.
    pub fn close(&self) -> Result<()> {
        let Some(state) = self.lock().take() else {
            return Ok(());
        };
        state.conn.close().map_err(|(_, err)| MemoryError::Storage(err))?;
        debug!(path = %self.path.display(), "Memory store closed");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<StoreState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut guard = self.lock();
        let state = guard.as_mut().ok_or(MemoryError::Closed)?;
        f(state)
    }

    #[cfg(test)]
    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> T {
        let guard = self.lock();
        let state = guard.as_ref().expect("store is open");
        f(&state.conn).expect("test query succeeds")
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(index::CREATE_INDEX_SQL)?;
    Ok(())
}

/// Case-insensitive substring scan over content, newest first.
fn substring_search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<Memory>> {
    let needle = query.to_lowercase();
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memories ORDER BY created_at DESC, seq DESC"
    ))?;
    let mut rows = stmt.query([])?;
    let mut results = Vec::new();
    while results.len() < limit {
        let Some(row) = rows.next()? else {
            break;
        };
        let content: String = row.get(1)?;
        if content.to_lowercase().contains(&needle) {
            results.push(Memory::from_row(row)?);
        }
    }
    Ok(results)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
