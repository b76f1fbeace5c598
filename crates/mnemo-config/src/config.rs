use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;

/// Default cap on memories injected by recall.
pub const DEFAULT_MAX_RECALL_RESULTS: usize = 5;

/// Memory store settings loaded from `~/.config/mnemo/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Database file override. `None` uses the per-user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    /// Inject relevant memories ahead of each user turn.
    pub auto_recall: bool,
    /// Extract and persist memories at the end of each turn.
    pub auto_capture: bool,
    /// Maximum memories injected by recall (0 falls back to the default).
    pub max_recall_results: usize,
    /// Verbose logging. Never changes store behavior.
    pub debug: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            auto_recall: true,
            auto_capture: true,
            max_recall_results: DEFAULT_MAX_RECALL_RESULTS,
            debug: false,
        }
    }
}

impl MemoryConfig {
    /// Load config from an explicit path, or from the default location.
    ///
    /// A missing file yields `Default`; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read memory config: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse memory config: {}", path.display()))
    }

    /// Parse config TOML, normalizing out-of-range values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Path to the config file: `~/.config/mnemo/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let dir = paths::config_dir().context("Failed to determine config directory")?;
        Ok(dir.join(paths::CONFIG_FILE_NAME))
    }

    /// Database path: the override if set, otherwise the per-user default.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(paths::default_db_path)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn normalized(mut self) -> Self {
        if self.max_recall_results == 0 {
            self.max_recall_results = DEFAULT_MAX_RECALL_RESULTS;
        }
        if self
            .db_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.db_path = None;
        }
        self
    }

    /// Generate default config TOML with comments as a template.
    pub fn default_template() -> String {
        r#"# mnemo configuration
# Location: ~/.config/mnemo/config.toml

# Database file. Defaults to the per-user data directory
# (~/.local/share/mnemo/memories.db on Linux).
# db_path = "/path/to/memories.db"

auto_recall = true         # Inject relevant memories before each user turn
auto_capture = true        # Extract memories at the end of each turn
max_recall_results = 5     # Memories injected per recall
debug = false              # Verbose logging only
"#
        .to_string()
    }

    /// Write the default template, creating directories as needed.
    /// Returns the path where the file was written.
    pub fn save_default_template(path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, Self::default_template())
            .with_context(|| format!("Failed to write memory config: {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
