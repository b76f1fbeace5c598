use mnemo_config::MemoryConfig;
use tracing::{debug, warn};

use crate::error::Result;
use crate::record::Memory;
use crate::store::MemoryStore;
use crate::turn::{CONTEXT_CLOSE_TAG, CONTEXT_OPEN_TAG, ChatMessage, Role, strip_recall_blocks};

/// The latest user message is truncated to this many characters before
/// it is used as a search query.
pub const RECALL_QUERY_MAX_CHARS: usize = 200;

/// Inject memories relevant to the latest user message.
///
/// Returns `messages` unchanged when recall is disabled, nothing matches, or
/// anything fails; a recall fault never reaches the conversation.
pub fn recall(
    store: &MemoryStore,
    config: &MemoryConfig,
    session_key: &str,
    messages: Vec<ChatMessage>,
) -> Vec<ChatMessage> {
    if !config.auto_recall {
        return messages;
    }
    match try_recall(store, config.max_recall_results, &messages) {
        Ok(Some(updated)) => {
            debug!(session_key, "Recalled memories injected");
            updated
        }
        Ok(None) => messages,
        Err(error) => {
            warn!(session_key, %error, "Memory recall failed; passing turn through");
            messages
        }
    }
}

/// Fallible recall. `Ok(None)` means there was nothing to inject.
pub fn try_recall(
    store: &MemoryStore,
    limit: usize,
    messages: &[ChatMessage],
) -> Result<Option<Vec<ChatMessage>>> {
    let Some(last_user) = messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
    else {
        return Ok(None);
    };
    let query: String = last_user
        .content
        .chars()
        .take(RECALL_QUERY_MAX_CHARS)
        .collect();
    if query.trim().is_empty() {
        return Ok(None);
    }

    let memories = store.search(&query, limit)?;
    if memories.is_empty() {
        return Ok(None);
    }

    let block = format_context_block(&memories);
    let mut updated = messages.to_vec();
    match updated.first_mut() {
        Some(first) if first.role == Role::System => {
            let existing = strip_recall_blocks(&first.content);
            let existing = existing.trim_end();
            first.content = if existing.is_empty() {
                block
            } else {
                format!("{existing}\n\n{block}")
            };
        }
        _ => updated.insert(0, ChatMessage::system(block)),
    }
    Ok(Some(updated))
}

/// Render memories as a tagged bullet list inside the recall markers.
pub fn format_context_block(memories: &[Memory]) -> String {
    let mut block = String::from(CONTEXT_OPEN_TAG);
    block.push('\n');
    for memory in memories {
        let content = memory.content.replace('\n', " ");
        block.push_str(&format!("- [{}] {}\n", memory.category, content.trim()));
    }
    block.push_str(CONTEXT_CLOSE_TAG);
    block
}
