use super::*;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = MemoryConfig::default();
    assert!(config.auto_recall);
    assert!(config.auto_capture);
    assert_eq!(config.max_recall_results, 5);
    assert!(!config.debug);
    assert!(config.db_path.is_none());
    assert!(config.is_default());
}

#[test]
fn test_parse_empty_uses_defaults() {
    let config = MemoryConfig::parse("").unwrap();
    assert!(config.is_default());
}

#[test]
fn test_parse_toml() {
    let config = MemoryConfig::parse(
        r#"
db_path = "/var/lib/mnemo/memories.db"
auto_recall = false
max_recall_results = 8
debug = true
"#,
    )
    .unwrap();
    assert_eq!(
        config.db_path.as_deref(),
        Some(Path::new("/var/lib/mnemo/memories.db"))
    );
    assert!(!config.auto_recall);
    assert!(config.auto_capture, "unset fields keep their defaults");
    assert_eq!(config.max_recall_results, 8);
    assert!(config.debug);
}

#[test]
fn test_zero_recall_results_normalized_to_default() {
    let config = MemoryConfig::parse("max_recall_results = 0").unwrap();
    assert_eq!(config.max_recall_results, DEFAULT_MAX_RECALL_RESULTS);
}

#[test]
fn test_empty_db_path_treated_as_unset() {
    let config = MemoryConfig::parse("db_path = \"\"").unwrap();
    assert!(config.db_path.is_none());
}

#[test]
fn test_parse_rejects_wrong_types() {
    assert!(MemoryConfig::parse("auto_recall = \"yes\"").is_err());
}

#[test]
fn test_resolved_db_path_prefers_override() {
    let config = MemoryConfig {
        db_path: Some(PathBuf::from("/tmp/custom.db")),
        ..MemoryConfig::default()
    };
    assert_eq!(config.resolved_db_path(), PathBuf::from("/tmp/custom.db"));

    let default_path = MemoryConfig::default().resolved_db_path();
    assert_eq!(default_path.file_name().unwrap(), paths::DB_FILE_NAME);
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let config = MemoryConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert!(config.is_default());
}

#[test]
fn test_load_malformed_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "auto_capture = [").unwrap();

    let err = MemoryConfig::load(Some(&path)).unwrap_err();
    let message = format!("{err:#}");
    assert!(
        message.contains("Failed to parse memory config"),
        "unexpected error: {message}"
    );
    assert!(message.contains("config.toml"));
}

#[test]
fn test_default_template_parses_to_default() {
    let config = MemoryConfig::parse(&MemoryConfig::default_template()).unwrap();
    assert!(config.is_default());
}

#[test]
fn test_save_default_template_creates_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let written = MemoryConfig::save_default_template(Some(&path)).unwrap();
    assert_eq!(written, path);

    let loaded = MemoryConfig::load(Some(&path)).unwrap();
    assert!(loaded.is_default());
}
