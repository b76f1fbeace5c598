use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mnemo_config::MemoryConfig;
use mnemo_core::{MemoryCategory, OutputFormat};
use mnemo_memory::{Memory, MemoryStore, classify};
use serde::Serialize;
use serde_json::json;

/// Profile output truncates recent memory content to this many characters.
const PROFILE_PREVIEW_CHARS: usize = 120;

/// Memory as shown to callers: the record without session and metadata.
#[derive(Debug, Serialize)]
pub(crate) struct MemorySummary {
    pub id: String,
    pub content: String,
    pub category: MemoryCategory,
    pub created_at: DateTime<Utc>,
}

impl MemorySummary {
    pub(crate) fn from_memory(memory: &Memory) -> Self {
        Self {
            id: memory.id.clone(),
            content: memory.content.clone(),
            category: memory.category,
            created_at: memory.created_at,
        }
    }
}

pub(crate) fn open_store(config: &MemoryConfig) -> Result<MemoryStore> {
    let path = config.resolved_db_path();
    MemoryStore::open(&path)
        .with_context(|| format!("Failed to open memory store: {}", path.display()))
}

pub(crate) fn handle_search(
    config: &MemoryConfig,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let limit = limit.unwrap_or(config.max_recall_results);
    let store = open_store(config)?;
    let results = store.search(query, limit)?;
    tracing::debug!(query, limit, hits = results.len(), "memory search");

    if format == OutputFormat::Json {
        let summaries: Vec<MemorySummary> =
            results.iter().map(MemorySummary::from_memory).collect();
        let output = json!({
            "results": summaries,
            "total": results.len(),
            "query": query,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Memory Search Results ({} matches):", results.len());
    if results.is_empty() {
        return Ok(());
    }
    println!();
    for (idx, memory) in results.iter().enumerate() {
        println!(
            "#{} {}  {}  [{}]",
            idx + 1,
            memory.id,
            format_timestamp(memory.created_at),
            memory.category
        );
        println!("   {}", truncate_chars(&memory.content, 80));
        println!();
    }
    Ok(())
}

pub(crate) fn handle_store(
    config: &MemoryConfig,
    content: &str,
    category: Option<MemoryCategory>,
    session: &str,
    format: OutputFormat,
) -> Result<()> {
    let category = category.unwrap_or_else(|| classify(content));
    let store = open_store(config)?;
    let memory =
        store.create_with_metadata(content, category, session, json!({ "source": "manual" }))?;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "success": true,
                "id": memory.id,
                "category": memory.category,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "Stored memory {} [{}] at {}.",
                memory.id,
                memory.category,
                memory.created_at.to_rfc3339()
            );
        }
    }
    Ok(())
}

pub(crate) fn handle_forget(config: &MemoryConfig, target: &str, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let deleted = store.forget(target)?;

    match format {
        OutputFormat::Json => {
            let output = json!({ "success": deleted > 0, "deleted": deleted });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if deleted == 0 => println!("No memories matched '{target}'."),
        OutputFormat::Text => println!("Forgot {deleted} {}.", plural(deleted)),
    }
    Ok(())
}

pub(crate) fn handle_profile(config: &MemoryConfig, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let profile = store.profile()?;

    if format == OutputFormat::Json {
        let recent: Vec<MemorySummary> = profile
            .recent
            .iter()
            .map(|memory| {
                let mut summary = MemorySummary::from_memory(memory);
                summary.content = summary.content.chars().take(PROFILE_PREVIEW_CHARS).collect();
                summary
            })
            .collect();
        let output = json!({
            "total": profile.total,
            "categories": profile.by_category,
            "db_size_kb": profile.db_size_kb(),
            "recent": recent,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Memories: {}", profile.total);
    println!("Database: {} ({} KB)", store.path().display(), profile.db_size_kb());
    if profile.by_category.is_empty() {
        return Ok(());
    }
    println!("Categories:");
    for (category, count) in &profile.by_category {
        println!("  {:<12} {count}", category.as_str());
    }
    println!("Recent:");
    for memory in &profile.recent {
        println!(
            "  {}  [{}]  {}",
            format_timestamp(memory.created_at),
            memory.category,
            truncate_chars(&memory.content, 60)
        );
    }
    Ok(())
}

pub(crate) fn handle_reindex(config: &MemoryConfig, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let indexed = store.reindex()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "indexed": indexed }))?);
        }
        OutputFormat::Text => {
            println!("Rebuilt memory index from {indexed} {}.", plural(indexed));
        }
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "memory" } else { "memories" }
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
