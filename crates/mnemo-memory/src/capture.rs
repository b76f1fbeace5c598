use mnemo_config::MemoryConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::error::Result;
use crate::extract::extract;
use crate::record::Memory;
use crate::store::MemoryStore;
use crate::turn::{ChatMessage, Role};

/// Existing memories inspected for an exact duplicate before storing.
const DEDUP_PROBE_LIMIT: usize = 1;

/// Outcome of one capture pass.
#[derive(Debug, Default, Serialize)]
pub struct CaptureReport {
    /// Candidates proposed by the extractor.
    pub candidates: usize,
    pub stored: Vec<Memory>,
    /// Candidates skipped because an identical memory already exists.
    pub duplicates: usize,
}

/// Extract and persist memories from a finished turn.
///
/// Never fails: errors are logged and the report covers whatever was stored
/// before the failure. Returns an empty report when capture is disabled.
pub fn capture(
    store: &MemoryStore,
    config: &MemoryConfig,
    session_key: &str,
    messages: &[ChatMessage],
) -> CaptureReport {
    let mut report = CaptureReport::default();
    if !config.auto_capture {
        return report;
    }
    match capture_into(store, session_key, messages, &mut report) {
        Ok(()) => {
            if !report.stored.is_empty() {
                info!(
                    session_key,
                    stored = report.stored.len(),
                    duplicates = report.duplicates,
                    "Memories captured from turn"
                );
            }
        }
        Err(error) => {
            warn!(session_key, %error, stored = report.stored.len(), "Memory capture failed");
        }
    }
    report
}

/// Fallible capture for callers that want the error.
pub fn try_capture(
    store: &MemoryStore,
    session_key: &str,
    messages: &[ChatMessage],
) -> Result<CaptureReport> {
    let mut report = CaptureReport::default();
    capture_into(store, session_key, messages, &mut report)?;
    Ok(report)
}

fn capture_into(
    store: &MemoryStore,
    session_key: &str,
    messages: &[ChatMessage],
    report: &mut CaptureReport,
) -> Result<()> {
    let text = messages
        .iter()
        .filter(|message| matches!(message.role, Role::User | Role::Assistant))
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let candidates = extract(&text);
    report.candidates = candidates.len();
    for candidate in candidates {
        if is_duplicate(store, &candidate)? {
            debug!(session_key, candidate = %candidate, "Skipping duplicate memory");
            report.duplicates += 1;
            continue;
        }
        let category = classify(&candidate);
        let memory = store.create_with_metadata(
            &candidate,
            category,
            session_key,
            serde_json::json!({ "source": "capture" }),
        )?;
        report.stored.push(memory);
    }
    Ok(())
}

fn is_duplicate(store: &MemoryStore, candidate: &str) -> Result<bool> {
    let normalized = candidate.to_lowercase();
    Ok(store
        .search(candidate, DEDUP_PROBE_LIMIT)?
        .iter()
        .any(|existing| existing.content.to_lowercase() == normalized))
}
