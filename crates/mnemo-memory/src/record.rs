use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use mnemo_core::MemoryCategory;
use rusqlite::Row;
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Column list shared by every query that materializes a [`Memory`].
pub(crate) const MEMORY_COLUMNS: &str = "id, content, category, session_key, created_at, metadata";

/// A persisted memory. Immutable once created; removed only by `forget`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub category: MemoryCategory,
    /// Originating session, empty for session-less memories.
    pub session_key: String,
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl Memory {
    /// Decode a row selected with [`MEMORY_COLUMNS`] (in that order).
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id: String = row.get(0)?;
        let content: String = row.get(1)?;
        let category_raw: String = row.get(2)?;
        let session_key: Option<String> = row.get(3)?;
        let created_at_raw: String = row.get(4)?;
        let metadata_raw: Option<String> = row.get(5)?;

        let category = category_raw.parse().unwrap_or_else(|_| {
            warn!(memory_id = %id, category = %category_raw, "unknown memory category; reading as other");
            MemoryCategory::Other
        });
        let created_at = parse_timestamp(&created_at_raw)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err)))?;

        Ok(Self {
            id,
            content,
            category,
            session_key: session_key.unwrap_or_default(),
            created_at,
            metadata: decode_metadata(metadata_raw.as_deref()),
        })
    }
}

/// Read-only aggregate over live memories.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub total: usize,
    /// Count per category. Only categories with at least one memory appear.
    pub by_category: BTreeMap<MemoryCategory, usize>,
    /// Approximate size of the main database file (excludes the WAL).
    pub db_size_bytes: u64,
    /// Most recent memories, newest first.
    pub recent: Vec<Memory>,
}

impl Profile {
    pub fn db_size_kb(&self) -> u64 {
        (self.db_size_bytes + 512) / 1024
    }
}

/// Fixed-width RFC 3339 with microseconds, so text order is time order.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 as written by the store, plus SQLite's
/// `datetime('now')` form for rows inserted by other tools.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|_| rfc_err),
    }
}

fn decode_metadata(raw: Option<&str>) -> serde_json::Value {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return serde_json::Value::Object(serde_json::Map::new());
    };
    serde_json::from_str(raw).unwrap_or_else(|error| {
        warn!(%error, "memory metadata is not valid JSON; keeping raw string");
        serde_json::Value::String(raw.to_string())
    })
}
