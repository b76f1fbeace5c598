//! Local memory store: SQLite records with a synchronized FTS5 index,
//! heuristic classification and extraction, and recall/capture for
//! conversation turns.

mod capture;
mod classify;
mod error;
mod extract;
mod index;
mod recall;
mod record;
mod store;
mod turn;

pub use capture::{CaptureReport, capture, try_capture};
pub use classify::{CLASSIFIER_RULES, ClassifierRule, classify};
pub use error::{MemoryError, Result};
pub use extract::{MAX_CANDIDATES, MEMORABLE_PATTERNS, extract};
pub use index::build_match_query;
pub use recall::{RECALL_QUERY_MAX_CHARS, format_context_block, recall, try_recall};
pub use record::{Memory, Profile};
pub use store::MemoryStore;
pub use turn::{CONTEXT_CLOSE_TAG, CONTEXT_OPEN_TAG, ChatMessage, Role};

pub use mnemo_core::MemoryCategory;
