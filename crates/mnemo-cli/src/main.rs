use anyhow::Result;
use clap::Parser;
use mnemo_config::MemoryConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod config_cmds;
mod memory_cmd;
mod turn_cmd;

use cli::{Cli, Commands, ConfigCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_format = cli.format;

    // Loaded before tracing so the config `debug` flag can raise verbosity;
    // a malformed file is only fatal for commands that need it.
    let loaded = MemoryConfig::load(cli.config.as_deref());
    let debug = cli.debug || loaded.as_ref().is_ok_and(|config| config.debug);
    init_tracing(debug);

    if let Commands::Config {
        cmd: ConfigCommands::Init { force },
    } = cli.command
    {
        return config_cmds::handle_config_init(cli.config.as_deref(), force);
    }

    let mut config = loaded?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    match cli.command {
        Commands::Search { query, limit } => {
            memory_cmd::handle_search(&config, &query, limit, output_format)
        }
        Commands::Store {
            content,
            category,
            session,
        } => memory_cmd::handle_store(&config, &content, category, &session, output_format),
        Commands::Forget { target } => memory_cmd::handle_forget(&config, &target, output_format),
        Commands::Profile => memory_cmd::handle_profile(&config, output_format),
        Commands::Reindex => memory_cmd::handle_reindex(&config, output_format),
        Commands::Recall { session } => turn_cmd::handle_recall(&config, &session),
        Commands::Capture { session } => {
            turn_cmd::handle_capture(&config, &session, output_format)
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config_cmds::handle_config_show(&config, output_format),
            ConfigCommands::Init { force } => {
                config_cmds::handle_config_init(cli.config.as_deref(), force)
            }
        },
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise `warn`, or `debug` when requested.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}
