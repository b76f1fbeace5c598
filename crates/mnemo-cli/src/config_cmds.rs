use std::path::Path;

use anyhow::{Result, bail};
use mnemo_config::MemoryConfig;
use mnemo_core::OutputFormat;

pub(crate) fn handle_config_show(config: &MemoryConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(config)?;
            value["db_path"] = serde_json::Value::String(
                config.resolved_db_path().display().to_string(),
            );
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(config)?);
            if config.db_path.is_none() {
                println!("# db_path = \"{}\"", config.resolved_db_path().display());
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => MemoryConfig::config_path()?,
    };
    if target.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            target.display()
        );
    }
    let written = MemoryConfig::save_default_template(Some(&target))?;
    eprintln!("Generated config template at: {}", written.display());
    Ok(())
}
