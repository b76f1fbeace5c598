use std::io::Read;

use anyhow::{Context, Result};
use mnemo_config::MemoryConfig;
use mnemo_core::OutputFormat;
use mnemo_memory::{CaptureReport, ChatMessage, capture, recall};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::memory_cmd::{MemorySummary, open_store, truncate_chars};

/// Turn payload accepted on stdin.
#[derive(Deserialize)]
#[serde(untagged)]
enum TurnInput {
    Wrapped { messages: Vec<ChatMessage> },
    Bare(Vec<ChatMessage>),
}

fn parse_turn(raw: &str) -> Result<Vec<ChatMessage>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let input: TurnInput = serde_json::from_str(raw).context(
        "Failed to parse turn: expected {\"messages\": [...]} or an array of {role, content}",
    )?;
    Ok(match input {
        TurnInput::Wrapped { messages } | TurnInput::Bare(messages) => messages,
    })
}

fn read_turn(mut reader: impl Read) -> Result<Vec<ChatMessage>> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .context("Failed to read turn from stdin")?;
    parse_turn(&raw)
}

/// Print the turn with recalled memories injected. Any store failure passes
/// the turn through unchanged; only unreadable input is an error.
pub(crate) fn handle_recall(config: &MemoryConfig, session: &str) -> Result<()> {
    let messages = read_turn(std::io::stdin().lock())?;
    let messages = match open_store(config) {
        Ok(store) => recall(&store, config, session, messages),
        Err(error) => {
            warn!(session_key = session, "Memory recall skipped: {error:#}");
            messages
        }
    };
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

/// Capture memories from the turn on stdin and print a summary. Store
/// failures are logged and reported as an empty capture.
pub(crate) fn handle_capture(
    config: &MemoryConfig,
    session: &str,
    format: OutputFormat,
) -> Result<()> {
    let messages = read_turn(std::io::stdin().lock())?;
    let report = match open_store(config) {
        Ok(store) => capture(&store, config, session, &messages),
        Err(error) => {
            warn!(session_key = session, "Memory capture skipped: {error:#}");
            CaptureReport::default()
        }
    };

    match format {
        OutputFormat::Json => {
            let stored: Vec<MemorySummary> =
                report.stored.iter().map(MemorySummary::from_memory).collect();
            let output = json!({
                "candidates": report.candidates,
                "stored": stored,
                "duplicates": report.duplicates,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "Captured {} of {} candidates ({} duplicates).",
                report.stored.len(),
                report.candidates,
                report.duplicates
            );
            for memory in &report.stored {
                println!(
                    "  {}  [{}]  {}",
                    memory.id,
                    memory.category,
                    truncate_chars(&memory.content, 60)
                );
            }
        }
    }
    Ok(())
}
