mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{spawn_mock_ollama_blocking, write_config, MockMode};

fn cmdcat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cmdcat");
    path
}

/// Temp workspace with the embedding provider disabled.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), None);
    (tmp, config_path)
}

fn run_cmdcat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cmdcat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cmdcat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_catalog(root: &Path) -> PathBuf {
    let path = root.join("catalog.json");
    fs::write(
        &path,
        r#"[
  {"name": "cphaprob", "category": "clusterxl",
   "description": "Show cluster member state",
   "arguments": [{"argument": "state", "description": "member state"}, {"argument": "-a if"}],
   "keywords": "cluster,ha", "mode": "expert", "device": "gateway"},
  {"name": "fw stat", "category": "firewall",
   "description": "Show installed policy name and install time",
   "mode": "expert", "device": "gateway"},
  {"name": "cpstat mg", "category": "management",
   "description": "Management server status summary",
   "mode": "expert", "device": "management", "type": "diagnostic"},
  {"name": "cphaprob", "category": "clusterxl",
   "description": "Duplicate entry"},
  {"name": "   ", "category": "clusterxl"}
]"#,
    )
    .unwrap();
    path
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();
    let (stdout, _, success) = run_cmdcat(&config, &["init"]);
    assert!(success);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/catalog.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config) = setup_test_env();
    let (_, _, s1) = run_cmdcat(&config, &["init"]);
    let (_, _, s2) = run_cmdcat(&config, &["init"]);
    assert!(s1);
    assert!(s2);
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_cmdcat(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_add_without_provider_keeps_record() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_cmdcat(
        &config,
        &[
            "add",
            "cphaprob",
            "clusterxl",
            "--description",
            "Show cluster member state",
            "--arg",
            "state=member state",
            "--device",
            "gateway",
        ],
    );
    assert!(!success, "add must report the missing embedding");
    assert!(stderr.contains("command 1"), "stderr: {}", stderr);

    let (stdout, _, success) = run_cmdcat(&config, &["--json", "get", "1"]);
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["name"], "cphaprob");
    assert_eq!(json["category"], "clusterxl");
    assert_eq!(json["device"], "gateway");
    assert_eq!(json["arguments"][0]["argument"], "state");
    assert_eq!(json["has_embedding"], false);
    assert!(json["created_at"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_duplicate_add_names_existing_id() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["add", "fw stat", "firewall"]);
    let (_, stderr, success) = run_cmdcat(&config, &["add", "fw stat", "firewall"]);
    assert!(!success);
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
    assert!(stderr.contains("id 1"), "stderr: {}", stderr);

    // Same name in another category is a different command.
    let (_, stderr, _) = run_cmdcat(&config, &["add", "fw stat", "vsx"]);
    assert!(stderr.contains("command 2"), "stderr: {}", stderr);
}

#[test]
fn test_get_missing_command() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["init"]);
    let (_, stderr, success) = run_cmdcat(&config, &["get", "99"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_update_and_delete() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["add", "cphaprob", "clusterxl"]);

    // Keyword-only edits do not touch the embedding, so they succeed even
    // without a provider.
    let (stdout, _, success) = run_cmdcat(
        &config,
        &["update", "1", "--keywords", "cluster, ha", "--deprecated", "true"],
    );
    assert!(success);
    assert!(stdout.contains("Updated command 1"));

    let (stdout, _, _) = run_cmdcat(&config, &["--json", "get", "1"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["keywords"], "cluster,ha");
    assert_eq!(json["deprecated"], true);

    let (_, stderr, success) = run_cmdcat(&config, &["update", "1"]);
    assert!(!success);
    assert!(stderr.contains("nothing to update"));

    let (stdout, _, success) = run_cmdcat(&config, &["delete", "1"]);
    assert!(success);
    assert!(stdout.contains("Deleted command 1"));

    let (_, _, success) = run_cmdcat(&config, &["get", "1"]);
    assert!(!success);
    let (_, stderr, success) = run_cmdcat(&config, &["delete", "1"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_validate_reports_missing_embeddings() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["add", "cphaprob", "clusterxl"]);

    let (stdout, _, success) = run_cmdcat(&config, &["validate"]);
    assert!(success);
    assert!(stdout.contains("missing embeddings: 1"), "stdout: {}", stdout);

    let (_, stderr, success) = run_cmdcat(&config, &["validate", "--strict"]);
    assert!(!success);
    assert!(stderr.contains("integrity violation"), "stderr: {}", stderr);
}

#[test]
fn test_validate_clean_catalog() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["init"]);
    let (stdout, _, success) = run_cmdcat(&config, &["validate", "--strict"]);
    assert!(success);
    assert!(stdout.contains("status: ok"));
}

#[test]
fn test_import_reports_duplicates_and_invalid() {
    let (tmp, config) = setup_test_env();
    let catalog = write_catalog(tmp.path());

    let (stdout, stderr, success) =
        run_cmdcat(&config, &["--json", "import", catalog.to_str().unwrap()]);
    assert!(success, "stderr: {}", stderr);

    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["imported"], serde_json::json!([1, 2, 3]));
    assert_eq!(summary["embedding_failures"], serde_json::json!([1, 2, 3]));
    assert_eq!(summary["skipped_duplicates"][0]["index"], 3);
    assert_eq!(summary["skipped_duplicates"][0]["existing_id"], 1);
    assert_eq!(summary["invalid"][0]["index"], 4);

    let (stdout, _, _) = run_cmdcat(&config, &["duplicates"]);
    assert!(stdout.contains("No duplicates."));
}

#[test]
fn test_import_rejects_malformed_file() {
    let (tmp, config) = setup_test_env();
    let path = tmp.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();
    let (_, stderr, success) = run_cmdcat(&config, &["import", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to parse import file"));
}

#[test]
fn test_search_errors_when_provider_disabled() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["add", "cphaprob", "clusterxl"]);
    let (_, stderr, success) = run_cmdcat(&config, &["search", "cluster state"]);
    assert!(!success);
    assert!(stderr.contains("embedding provider unavailable"), "stderr: {}", stderr);
}

#[test]
fn test_search_rejects_bad_threshold() {
    let (_tmp, config) = setup_test_env();
    run_cmdcat(&config, &["init"]);
    let (_, stderr, success) = run_cmdcat(&config, &["search", "cluster", "--threshold", "1.5"]);
    assert!(!success);
    assert!(stderr.contains("threshold"), "stderr: {}", stderr);
}

#[test]
fn test_embed_pending_errors_when_disabled() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_cmdcat(&config, &["embed", "pending"]);
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_embed_rebuild_errors_when_disabled() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_cmdcat(&config, &["embed", "rebuild"]);
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

// ============ With a mock Ollama server ============

#[test]
fn test_search_end_to_end() {
    let mock = spawn_mock_ollama_blocking(MockMode::Healthy);
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), Some(&mock.url));
    let catalog = write_catalog(tmp.path());

    let (stdout, stderr, success) =
        run_cmdcat(&config, &["--json", "import", catalog.to_str().unwrap()]);
    assert!(success, "stderr: {}", stderr);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["embedding_failures"], serde_json::json!([]));

    let (stdout, stderr, success) = run_cmdcat(
        &config,
        &["--json", "search", "show cluster member state", "--threshold", "0.1"],
    );
    assert!(success, "stderr: {}", stderr);
    let hits: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0]["name"], "cphaprob");
    assert_eq!(hits[0]["arguments"][1]["argument"], "-a if");
    let scores: Vec<f64> = hits.iter().map(|h| h["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    let (stdout, _, success) = run_cmdcat(
        &config,
        &["--json", "search", "show status", "--device", "management", "--threshold", "0"],
    );
    assert!(success);
    let hits: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(hits.iter().all(|h| h["device"] == "management" || h["device"] == "any"));

    let (stdout, _, success) = run_cmdcat(&config, &["validate", "--strict"]);
    assert!(success);
    assert!(stdout.contains("status: ok"));
}

#[test]
fn test_embed_pending_repairs_records_added_offline() {
    let tmp = TempDir::new().unwrap();
    let offline = write_config(tmp.path(), None);
    run_cmdcat(&offline, &["add", "cphaprob", "clusterxl", "--description", "Show cluster member state"]);
    run_cmdcat(&offline, &["add", "fw stat", "firewall"]);

    let mock = spawn_mock_ollama_blocking(MockMode::Healthy);
    let online = write_config(tmp.path(), Some(&mock.url));

    let (stdout, _, success) = run_cmdcat(&online, &["embed", "pending", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("records needing embeddings: 2"));
    assert_eq!(mock.hits(), 0);

    let (stdout, _, success) = run_cmdcat(&online, &["embed", "pending"]);
    assert!(success);
    assert!(stdout.contains("embedded: 2"));

    let (stdout, _, _) = run_cmdcat(&online, &["embed", "pending"]);
    assert!(stdout.contains("nothing to embed"));

    let (stdout, _, success) = run_cmdcat(&online, &["--json", "get", "1"]);
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["has_embedding"], true);
}

#[test]
fn test_embed_rebuild_reports_failures() {
    let mock = spawn_mock_ollama_blocking(MockMode::ServerError);
    let tmp = TempDir::new().unwrap();
    let offline = write_config(tmp.path(), None);
    run_cmdcat(&offline, &["add", "cphaprob", "clusterxl"]);

    let config = write_config(tmp.path(), Some(&mock.url));
    let (stdout, _, success) = run_cmdcat(&config, &["--json", "embed", "rebuild"]);
    assert!(success, "per-record failures do not fail the run");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["success_count"], 0);
    assert_eq!(summary["failure_count"], 1);
    assert_eq!(summary["failures"][0]["id"], 1);

    let (_, stderr, success) = run_cmdcat(&config, &["embed", "rebuild", "--id", "1"]);
    assert!(!success);
    assert!(stderr.contains("command 1"), "stderr: {}", stderr);
}
