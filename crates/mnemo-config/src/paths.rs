use std::path::PathBuf;

/// XDG app name used for config and data directories.
pub const APP_NAME: &str = "mnemo";
/// File name of the memory database inside the data directory.
pub const DB_FILE_NAME: &str = "memories.db";
/// File name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory (`~/.config/mnemo` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Per-user data directory holding the memory database.
///
/// Falls back to `~/.local/share/mnemo` when project dirs cannot be resolved,
/// and to a temp directory when there is no home directory at all
/// (e.g. minimal containers).
pub fn data_dir() -> PathBuf {
    if let Some(project_dirs) = directories::ProjectDirs::from("", "", APP_NAME) {
        return project_dirs.data_local_dir().to_path_buf();
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs
            .home_dir()
            .join(".local")
            .join("share")
            .join(APP_NAME);
    }

    std::env::temp_dir().join(format!("{APP_NAME}-data"))
}

/// Default database location: `<data dir>/memories.db`.
pub fn default_db_path() -> PathBuf {
    data_dir().join(DB_FILE_NAME)
}
