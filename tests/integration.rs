mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{spawn_mock_ollama, write_docx};

fn passage_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("passage");
    path
}

/// Temp dir with a config file. `embedding` is appended verbatim.
fn setup_test_env(embedding: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("files")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/passage.sqlite"

[chunking]
strategy = "paragraph"

[retrieval]
top_k = 5

{}
"#,
        root.display(),
        embedding
    );

    let config_path = config_dir.join("passage.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn ollama_section(url: &str) -> String {
    format!(
        r#"[embedding]
provider = "ollama"
model = "mock-embed"
dims = 3
url = "{}"
max_retries = 0
timeout_secs = 5
"#,
        url
    )
}

fn run_passage(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = passage_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("PASSAGE_DB_PATH")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run passage binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn files_dir(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().join("files")
}

fn write_sample_docx(config_path: &Path) -> PathBuf {
    let path = files_dir(config_path).join("notes.docx");
    write_docx(
        &path,
        &[
            "Rust ownership rules keep rust programs memory safe.",
            "Python notebooks make python experiments quick.",
            "Garden tomatoes need sun; a garden needs water.",
        ],
    );
    path
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_passage(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, _, success1) = run_passage(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_passage(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_index_unsupported_file_type() {
    let (_tmp, config_path) = setup_test_env("");
    let path = files_dir(&config_path).join("notes.txt");
    fs::write(&path, "plain text is not supported").unwrap();

    let (_, stderr, success) = run_passage(&config_path, &["index", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Unsupported file type"), "stderr={}", stderr);
}

#[test]
fn test_index_unknown_strategy() {
    let (_tmp, config_path) = setup_test_env("");
    let path = write_sample_docx(&config_path);

    let (_, stderr, success) = run_passage(
        &config_path,
        &["index", path.to_str().unwrap(), "--strategy", "words", "--dry-run"],
    );
    assert!(!success);
    assert!(stderr.contains("unknown split strategy"), "stderr={}", stderr);
}

#[test]
fn test_index_invalid_overlap() {
    let (_tmp, config_path) = setup_test_env("");
    let path = write_sample_docx(&config_path);

    let (_, stderr, success) = run_passage(
        &config_path,
        &[
            "index",
            path.to_str().unwrap(),
            "--strategy",
            "fixed_size",
            "--chunk-size",
            "10",
            "--overlap",
            "10",
            "--dry-run",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("overlap"), "stderr={}", stderr);
}

#[test]
fn test_index_dry_run_counts_paragraphs() {
    let (_tmp, config_path) = setup_test_env("");
    let path = write_sample_docx(&config_path);

    let (stdout, stderr, success) =
        run_passage(&config_path, &["index", path.to_str().unwrap(), "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("strategy: paragraph"));
    assert!(stdout.contains("chunks: 3"));
}

#[test]
fn test_index_disabled_provider_fails() {
    let (_tmp, config_path) = setup_test_env("");
    let path = write_sample_docx(&config_path);

    let (_, stderr, success) = run_passage(&config_path, &["index", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("disabled"), "stderr={}", stderr);
}

#[test]
fn test_search_empty_store() {
    let (_tmp, config_path) = setup_test_env("");
    run_passage(&config_path, &["init"]);

    let (stdout, stderr, success) = run_passage(&config_path, &["search", "anything"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_passage(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_index_then_search_ranks_matching_paragraph_first() {
    let url = spawn_mock_ollama();
    let (_tmp, config_path) = setup_test_env(&ollama_section(&url));
    let path = write_sample_docx(&config_path);

    let (stdout, stderr, success) = run_passage(
        &config_path,
        &["index", path.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks written: 3"));
    assert!(stdout.contains("dimensions: 3"));

    let (stdout, stderr, success) =
        run_passage(&config_path, &["search", "python", "--top-k", "2", "--json"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(results[0]["id"], 2);
    assert_eq!(results[0]["filename"], "notes.docx");
    assert_eq!(results[0]["split_strategy"], "paragraph");
    assert!(results[0]["chunk_text"]
        .as_str()
        .unwrap()
        .starts_with("Python notebooks"));
    assert!((results[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert!(results[1]["score"].as_f64().unwrap() < 1e-6);
}

#[test]
fn test_search_text_output_format() {
    let url = spawn_mock_ollama();
    let (_tmp, config_path) = setup_test_env(&ollama_section(&url));
    let path = write_sample_docx(&config_path);
    run_passage(&config_path, &["index", path.to_str().unwrap(), "--progress", "off"]);

    let (stdout, stderr, success) =
        run_passage(&config_path, &["search", "garden", "--top-k", "1"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Searching: 'garden'"));
    assert!(stdout.contains("Found 1 similar chunks:"));
    assert!(stdout.contains("Result #1 (similarity: 1.0000)"));
    assert!(stdout.contains("File: notes.docx"));
    assert!(stdout.contains("Split strategy: paragraph"));
    assert!(stdout.contains("ID: 3"));
    assert!(stdout.contains("Garden tomatoes need sun"));
}

#[test]
fn test_replace_and_append_modes() {
    let url = spawn_mock_ollama();
    let (_tmp, config_path) = setup_test_env(&ollama_section(&url));
    let path = write_sample_docx(&config_path);
    let file = path.to_str().unwrap();

    let (_, stderr, success) = run_passage(&config_path, &["index", file, "--progress", "off"]);
    assert!(success, "stderr={}", stderr);
    let (_, stderr, success) = run_passage(&config_path, &["index", file, "--progress", "off"]);
    assert!(success, "stderr={}", stderr);

    let (stdout, _, _) = run_passage(&config_path, &["stats"]);
    assert!(stdout.contains("Chunks:      3"), "stats={}", stdout);

    let (stdout, stderr, success) = run_passage(
        &config_path,
        &["index", file, "--append", "--progress", "off"],
    );
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("mode: append"));

    let (stdout, _, _) = run_passage(&config_path, &["stats"]);
    assert!(stdout.contains("Chunks:      6"), "stats={}", stdout);
    assert!(stdout.contains("Dimensions:  3"));
    assert!(stdout.contains("notes.docx"));

    let (stdout, _, success) = run_passage(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("Deleted 6 chunks."));

    let (stdout, _, _) = run_passage(&config_path, &["stats"]);
    assert!(stdout.contains("Chunks:      0"), "stats={}", stdout);
}

#[test]
fn test_json_progress_on_stderr() {
    let url = spawn_mock_ollama();
    let (_tmp, config_path) = setup_test_env(&ollama_section(&url));
    let path = write_sample_docx(&config_path);

    let (_, stderr, success) = run_passage(
        &config_path,
        &["index", path.to_str().unwrap(), "--progress", "json"],
    );
    assert!(success, "stderr={}", stderr);
    let phases: Vec<String> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter_map(|v| v["phase"].as_str().map(str::to_string))
        .collect();
    assert_eq!(phases.first().map(String::as_str), Some("extracted"));
    assert_eq!(phases.last().map(String::as_str), Some("persisted"));
    assert_eq!(phases.iter().filter(|p| *p == "embedding").count(), 3);
}
