use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mnemo_core::{MemoryCategory, OutputFormat};

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(about = "mnemo: local long-term memory for conversational agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (defaults to ~/.config/mnemo/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured location
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search memories by keyword (BM25 ranked)
    Search {
        /// Free-text query
        query: String,

        /// Max results (defaults to max_recall_results)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Store a memory
    Store {
        /// The information to remember
        content: String,

        /// Category; inferred from the content when omitted
        #[arg(short, long, value_enum)]
        category: Option<MemoryCategory>,

        /// Session the memory belongs to
        #[arg(short, long, default_value = "")]
        session: String,
    },

    /// Delete memories by exact ID or case-insensitive keyword
    Forget {
        /// Memory ID or keyword
        target: String,
    },

    /// Show memory stats: total, categories, database size
    Profile,

    /// Rebuild the full-text index from stored memories
    Reindex,

    /// Inject relevant memories into a turn read from stdin (JSON)
    Recall {
        /// Session key of the conversation
        #[arg(short, long, default_value = "")]
        session: String,
    },

    /// Extract and store memories from a finished turn read from stdin (JSON)
    Capture {
        /// Session key of the conversation
        #[arg(short, long, default_value = "")]
        session: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration
    Show,
}
