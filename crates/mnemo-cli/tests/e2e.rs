// End-to-end tests for the mnemo binary. Every run points --db and --config
// into a temp dir so the user's own store is never touched.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn mnemo(dir: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let db = dir.join("memories.db");
    let config = dir.join("config.toml");
    let mut child = Command::new(env!("CARGO_BIN_EXE_mnemo"))
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn mnemo");
    {
        let mut pipe = child.stdin.take().expect("stdin piped");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("write stdin");
        }
    }
    child.wait_with_output().expect("failed to wait for mnemo")
}

fn json_output(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "mnemo failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_help_displays_correctly() {
    let output = Command::new(env!("CARGO_BIN_EXE_mnemo"))
        .arg("--help")
        .output()
        .expect("failed to run mnemo --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["search", "store", "forget", "profile", "reindex", "recall", "capture", "config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn store_then_search_returns_memory() {
    let dir = tempfile::tempdir().unwrap();

    let stored = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "store", "We decided to switch to Postgres"],
        None,
    ));
    assert_eq!(stored["success"], true);
    assert_eq!(stored["category"], "decision");
    let id = stored["id"].as_str().unwrap().to_string();

    let found = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "search", "postgres"],
        None,
    ));
    assert_eq!(found["total"], 1);
    assert_eq!(found["query"], "postgres");
    assert_eq!(found["results"][0]["id"], id.as_str());
    assert_eq!(
        found["results"][0]["content"],
        "We decided to switch to Postgres"
    );
}

#[test]
fn explicit_category_overrides_inference() {
    let dir = tempfile::tempdir().unwrap();
    let stored = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "store", "The sky is blue", "--category", "entity"],
        None,
    ));
    assert_eq!(stored["category"], "entity");
}

#[test]
fn forget_by_keyword_updates_profile() {
    let dir = tempfile::tempdir().unwrap();
    mnemo(dir.path(), &["store", "I prefer dark mode"], None);
    mnemo(dir.path(), &["store", "The sky is blue"], None);

    let profile = json_output(&mnemo(dir.path(), &["--format", "json", "profile"], None));
    assert_eq!(profile["total"], 2);
    assert_eq!(profile["categories"]["preference"], 1);
    assert_eq!(profile["categories"]["fact"], 1);

    let forgot = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "forget", "DARK MODE"],
        None,
    ));
    assert_eq!(forgot["success"], true);
    assert_eq!(forgot["deleted"], 1);

    let profile = json_output(&mnemo(dir.path(), &["--format", "json", "profile"], None));
    assert_eq!(profile["total"], 1);
    assert!(profile["categories"].get("preference").is_none());

    let none = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "forget", "nonexistent"],
        None,
    ));
    assert_eq!(none["success"], false);
    assert_eq!(none["deleted"], 0);
}

#[test]
fn search_tolerates_query_syntax() {
    let dir = tempfile::tempdir().unwrap();
    mnemo(dir.path(), &["store", "Remember the NEAR clause"], None);

    let found = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "search", "\"NEAR(clause*"],
        None,
    ));
    assert_eq!(found["total"], 1);

    let empty = json_output(&mnemo(dir.path(), &["--format", "json", "search", "!!!"], None));
    assert_eq!(empty["total"], 0);
}

#[test]
fn recall_injects_context_block() {
    let dir = tempfile::tempdir().unwrap();
    mnemo(dir.path(), &["store", "We decided to switch to Postgres"], None);

    let messages = json_output(&mnemo(
        dir.path(),
        &["recall", "--session", "s1"],
        Some(r#"{"messages":[{"role":"user","content":"Which database, Postgres?"}]}"#),
    ));
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    let block = messages[0]["content"].as_str().unwrap();
    assert!(block.starts_with("<mnemo-context>"));
    assert!(block.contains("- [decision] We decided to switch to Postgres"));
}

#[test]
fn recall_passes_through_without_matches() {
    let dir = tempfile::tempdir().unwrap();
    let messages = json_output(&mnemo(
        dir.path(),
        &["recall"],
        Some(r#"[{"role":"user","content":"hello"}]"#),
    ));
    assert_eq!(
        messages,
        serde_json::json!([{"role": "user", "content": "hello"}])
    );
}

#[test]
fn capture_stores_and_dedups() {
    let dir = tempfile::tempdir().unwrap();
    let turn = r#"{"messages":[
        {"role":"user","content":"I always review pull requests after lunch."},
        {"role":"assistant","content":"Got it."}
    ]}"#;

    let first = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "capture", "--session", "s1"],
        Some(turn),
    ));
    assert_eq!(first["candidates"], 1);
    assert_eq!(
        first["stored"][0]["content"],
        "I always review pull requests after lunch"
    );

    let second = json_output(&mnemo(
        dir.path(),
        &["--format", "json", "capture", "--session", "s1"],
        Some(turn),
    ));
    assert_eq!(second["duplicates"], 1);
    assert_eq!(second["stored"].as_array().unwrap().len(), 0);
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    let first = mnemo(dir.path(), &["config", "init"], None);
    assert!(first.status.success());
    assert!(dir.path().join("config.toml").exists());

    let second = mnemo(dir.path(), &["config", "init"], None);
    assert!(!second.status.success());

    let forced = mnemo(dir.path(), &["config", "init", "--force"], None);
    assert!(forced.status.success());

    let shown = json_output(&mnemo(dir.path(), &["--format", "json", "config", "show"], None));
    assert_eq!(shown["auto_recall"], true);
    assert_eq!(shown["max_recall_results"], 5);
}
