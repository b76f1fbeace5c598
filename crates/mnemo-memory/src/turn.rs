//! Conversation message types and the markers around injected recall blocks.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opening marker of an injected recall block.
pub const CONTEXT_OPEN_TAG: &str = "<mnemo-context>";
/// Closing marker of an injected recall block.
pub const CONTEXT_CLOSE_TAG: &str = "</mnemo-context>";

static RECALL_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s){}.*?{}",
        regex::escape(CONTEXT_OPEN_TAG),
        regex::escape(CONTEXT_CLOSE_TAG)
    ))
    .expect("valid recall block regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Remove every injected recall block from `text`.
pub(crate) fn strip_recall_blocks(text: &str) -> String {
    RECALL_BLOCK_RE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_recall_blocks_across_lines() {
        let text = "before\n<mnemo-context>\n- [fact] x\n</mnemo-context>\nafter";
        assert_eq!(strip_recall_blocks(text), "before\n\nafter");
    }

    #[test]
    fn test_strip_recall_blocks_is_non_greedy() {
        let text = "<mnemo-context>a</mnemo-context>keep<mnemo-context>b</mnemo-context>";
        assert_eq!(strip_recall_blocks(text), "keep");
    }

    #[test]
    fn test_unterminated_block_is_left_alone() {
        let text = "<mnemo-context> dangling";
        assert_eq!(strip_recall_blocks(text), text);
    }

    #[test]
    fn test_message_json_shape() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(message, ChatMessage::assistant("hi"));

        let without_content: ChatMessage = serde_json::from_str(r#"{"role":"tool"}"#).unwrap();
        assert_eq!(without_content.role, Role::Tool);
        assert!(without_content.content.is_empty());
    }
}
