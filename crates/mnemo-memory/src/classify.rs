//! Heuristic categorization of memory text.
//!
//! Rules are evaluated top to bottom and the first match wins, so a sentence
//! that reads as both a preference and a fact ("I love Rust, it is fast") is a
//! preference. Text matching no rule is `other`.

use std::sync::LazyLock;

use mnemo_core::MemoryCategory;
use regex::{Regex, RegexBuilder};

/// One entry of the ordered classifier table.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRule {
    pub category: MemoryCategory,
    /// Case-insensitive pattern matched anywhere in the text.
    pub pattern: &'static str,
}

/// Classifier table in precedence order.
pub const CLASSIFIER_RULES: [ClassifierRule; 4] = [
    ClassifierRule {
        category: MemoryCategory::Preference,
        pattern: r"\b(?:prefer(?:s|red|ring|ence|ences)?|likes?|liked|lov(?:e|es|ed|ing)|hat(?:e|es|ed|ing)|wants?|wanted|wanting|enjoy(?:s|ed|ing)?|dislik(?:e|es|ed|ing)|favou?rites?)\b",
    },
    ClassifierRule {
        category: MemoryCategory::Decision,
        pattern: r"\b(?:decided|will use|going with|chose|chosen|picked|switched to)\b",
    },
    ClassifierRule {
        category: MemoryCategory::Entity,
        pattern: r"\+?\d{10,}|[\w.+-]+@[\w-]+(?:\.[\w-]+)+|\b(?:is called|named|lives in|works at)\b",
    },
    ClassifierRule {
        category: MemoryCategory::Fact,
        pattern: r"\b(?:is|are|has|have|was|were)\b",
    },
];

static COMPILED_RULES: LazyLock<Vec<(MemoryCategory, Regex)>> = LazyLock::new(|| {
    CLASSIFIER_RULES
        .iter()
        .map(|rule| {
            let regex = RegexBuilder::new(rule.pattern)
                .case_insensitive(true)
                .build()
                .expect("valid classifier regex");
            (rule.category, regex)
        })
        .collect()
});

/// Assign a category to `text`. Pure and total.
pub fn classify(text: &str) -> MemoryCategory {
    COMPILED_RULES
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map_or(MemoryCategory::Other, |(category, _)| *category)
}
