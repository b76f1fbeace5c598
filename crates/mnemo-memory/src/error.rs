use std::path::PathBuf;

/// Errors returned by the memory store.
///
/// A `forget` that matches nothing is not an error; it reports zero deletions.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The database file or its directory could not be opened or created.
    #[error("memory storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The full-text index rejected a query. Search recovers from this with
    /// a substring scan; it only escapes through direct index calls.
    #[error("full-text index query failed: {0}")]
    IndexCorrupt(#[source] rusqlite::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("memory store is closed")]
    Closed,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
