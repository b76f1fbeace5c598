//! Candidate memory extraction from conversation text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::turn::strip_recall_blocks;

/// Maximum candidates returned per call.
pub const MAX_CANDIDATES: usize = 5;
/// Texts shorter than this (after stripping) yield nothing.
const MIN_TEXT_CHARS: usize = 20;
/// Sentence length window: longer than 15, shorter than 500.
const MIN_SENTENCE_CHARS: usize = 16;
const MAX_SENTENCE_CHARS: usize = 499;

/// Named heuristics; a sentence is memorable if any of them matches.
pub const MEMORABLE_PATTERNS: [(&str, &str); 7] = [
    (
        "self_reference",
        r"\b(?:my|i|we|our)\b.*\b(?:name|live[sd]?|work(?:s|ed|ing)?|born|prefer(?:s|red)?|like[sd]?|use[sd]?|using|decided|chose|favou?rite|email|phone|project|team|company)\b",
    ),
    ("frequency", r"\b(?:always|never|usually|every)\b"),
    ("marker", r"\b(?:remember|note|important|key|critical)\b"),
    (
        "biography",
        r"\b(?:is called|works at|lives in|born in|graduated from)\b",
    ),
    (
        "preference_action",
        r"\b(?:prefers?|enjoys?|dislikes?|loves?|hates?)\b.*\b(?:to\s+\w+|\w+ing)\b",
    ),
    (
        "migration",
        r"\b(?:switched to|started using|stopped using|migrated to)\b",
    ),
    (
        "schedule",
        r"\b(?:deadline|due|scheduled|meeting|appointment)\b",
    ),
];

static SYSTEM_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<system>.*?</system>").expect("valid system block regex"));

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?\n]+").expect("valid sentence split regex"));

static COMPILED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MEMORABLE_PATTERNS
        .iter()
        .map(|(_, pattern)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("valid memorable regex")
        })
        .collect()
});

/// Propose memorable sentences from `text`.
///
/// Injected recall blocks and `<system>` blocks are removed first so recalled
/// memories are never captured again. The result is deduplicated, keeps
/// first-seen order, and holds at most [`MAX_CANDIDATES`] items.
pub fn extract(text: &str) -> Vec<String> {
    let stripped = strip_recall_blocks(text);
    let cleaned = SYSTEM_BLOCK_RE.replace_all(&stripped, "");
    let cleaned = cleaned.trim();
    if cleaned.chars().count() < MIN_TEXT_CHARS {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for sentence in SENTENCE_SPLIT_RE.split(cleaned).map(str::trim) {
        let len = sentence.chars().count();
        if !(MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&len) {
            continue;
        }
        if !is_memorable(sentence) || !seen.insert(sentence) {
            continue;
        }
        candidates.push(sentence.to_string());
        if candidates.len() == MAX_CANDIDATES {
            break;
        }
    }
    candidates
}

fn is_memorable(sentence: &str) -> bool {
    COMPILED_PATTERNS.iter().any(|regex| regex.is_match(sentence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_input_yields_nothing() {
        assert!(extract("I always win.").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_extracts_self_referential_statement() {
        let found = extract("Hello there. My name is Priya and I work on compilers.");
        assert_eq!(found, vec!["My name is Priya and I work on compilers"]);
    }

    #[test]
    fn test_each_pattern_family_is_recognized() {
        let sentences = [
            "We always deploy on Tuesdays",
            "Please remember the staging password rotates",
            "The new intern graduated from Delft",
            "Alex enjoys writing parsers by hand",
            "The team migrated to GitLab last spring",
            "The quarterly report deadline is Friday",
        ];
        for sentence in sentences {
            assert_eq!(
                extract(&format!("{sentence}.")),
                vec![sentence.to_string()],
                "expected '{sentence}' to be memorable"
            );
        }
    }

    #[test]
    fn test_unremarkable_sentences_are_dropped() {
        assert!(extract("The build finished in forty seconds. Output looked fine.").is_empty());
    }

    #[test]
    fn test_sentence_length_window() {
        // 15 characters: too short even though "always" matches.
        assert!(extract("Fine. Always on it ok!! Sure thing then").is_empty());

        let long = format!("Remember {}", "x".repeat(495));
        assert_eq!(long.chars().count(), 504);
        assert!(extract(&long).is_empty());

        let edge = format!("Remember {}", "x".repeat(490));
        assert_eq!(edge.chars().count(), 499);
        assert_eq!(extract(&edge), vec![edge.clone()]);
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let text = "I always test first. Note the staging URL. I always test first.";
        assert_eq!(
            extract(text),
            vec!["I always test first", "Note the staging URL"]
        );
    }

    #[test]
    fn test_caps_at_five() {
        let text = (0..8)
            .map(|n| format!("Remember the item number {n}"))
            .collect::<Vec<_>>()
            .join(". ");
        let found = extract(&text);
        assert_eq!(found.len(), MAX_CANDIDATES);
        assert_eq!(found[0], "Remember the item number 0");
        assert_eq!(found[4], "Remember the item number 4");
    }

    #[test]
    fn test_strips_recall_block() {
        let text = "<mnemo-context>\n- [preference] I always use vim keybindings\n</mnemo-context>\nMy team ships on Fridays.";
        assert_eq!(extract(text), vec!["My team ships on Fridays"]);
    }

    #[test]
    fn test_strips_system_block() {
        let text = "<system>Remember you are a helpful assistant</system> We never merge on weekends.";
        assert_eq!(extract(text), vec!["We never merge on weekends"]);
    }

    #[test]
    fn test_splits_on_newlines_and_punctuation_runs() {
        let text = "Meeting moved to Thursday!!!\nI usually review PRs after lunch?";
        assert_eq!(
            extract(text),
            vec!["Meeting moved to Thursday", "I usually review PRs after lunch"]
        );
    }

    proptest! {
        #[test]
        fn prop_extract_respects_bounds(text in "(?s).{0,2000}") {
            let found = extract(&text);
            prop_assert!(found.len() <= MAX_CANDIDATES);
            for item in &found {
                let len = item.chars().count();
                prop_assert!(len > 15 && len < 500, "length {} out of range", len);
            }
        }

        #[test]
        fn prop_extract_has_no_duplicates(words in proptest::collection::vec("(always|note|meeting|[a-z]{3,9})", 0..60)) {
            let text = words.join(" ").replace("note", "note.");
            let found = extract(&text);
            let unique: HashSet<&String> = found.iter().collect();
            prop_assert_eq!(unique.len(), found.len());
        }
    }
}
