#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const OWNERSHIP_SCRIPT: &str = r#"{"steps": [
    {"match": {"tag": "p", "labels": "Person", "fields": {"name": "Alice"}}},
    {"connect": {"edge": {"direction": "forward", "labels": "OWNS"},
                 "node": {"tag": "h", "labels": "House"}}},
    {"where": {"field": "h.price", "operator": ">=", "value": 100000}},
    {"return": "h"}
]}"#;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn absent_config(dir: &TempDir) -> PathBuf {
    dir.path().join("no-config.toml")
}

fn stdout_of(dir: &TempDir, config: &Path, args: &[&str], script: &Path) -> String {
    let output = cargo_bin_cmd!("cypher-builder")
        .current_dir(dir.path())
        .arg("--config")
        .arg(config)
        .args(args)
        .arg(script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn render_prints_text_and_params() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_file(&dir, "owns.json", OWNERSHIP_SCRIPT);
    let stdout = stdout_of(&dir, &absent_config(&dir), &["render"], &script);
    assert!(stdout.starts_with(
        "MATCH (p:Person {name: $name})-[:OWNS]->(h:House)\nWHERE h.price >= $h_price\nRETURN h;\n"
    ));
    assert!(stdout.contains("$name = \"Alice\""));
    assert!(stdout.contains("$h_price = 100000"));
}

#[test]
fn render_json_output() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_file(&dir, "owns.json", OWNERSHIP_SCRIPT);
    let stdout = stdout_of(
        &dir,
        &absent_config(&dir),
        &["--format", "json", "render"],
        &script,
    );
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(
        json["text"],
        "MATCH (p:Person {name: $name})-[:OWNS]->(h:House)\nWHERE h.price >= $h_price\nRETURN h;"
    );
    assert_eq!(json["params"]["name"], "Alice");
    assert_eq!(json["params"]["h_price"], 100000);
}

#[test]
fn config_sets_format_and_collision_policy() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_file(
        &dir,
        "cli.toml",
        "default_format = \"json\"\n\n[builder]\ncollision_policy = \"overwrite\"\n",
    );
    let script = write_file(
        &dir,
        "clash.json",
        r#"{"steps": [
            {"match": {"tag": "p", "fields": {"name": "Alice"}}},
            {"where": {"field": "name", "operator": "=", "value": "Bob"}},
            {"return": "p"}
        ]}"#,
    );
    let stdout = stdout_of(&dir, &config, &["render"], &script);
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["params"]["name"], "Bob");
}

#[test]
fn collision_is_rejected_by_default() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_file(
        &dir,
        "clash.json",
        r#"{"steps": [
            {"match": {"tag": "p", "fields": {"name": "Alice"}}},
            {"where": {"field": "name", "operator": "=", "value": "Bob"}},
            {"return": "p"}
        ]}"#,
    );
    let output = cargo_bin_cmd!("cypher-builder")
        .arg("--config")
        .arg(absent_config(&dir))
        .arg("render")
        .arg(&script)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8 stderr");
    assert!(stderr.contains("name"), "stderr: {stderr}");
}

#[test]
fn failing_step_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let script = write_file(
        &dir,
        "bad.json",
        r#"{"steps": [{"match": {"tag": "p"}}, {"or": "p.age > 3"}]}"#,
    );
    let output = cargo_bin_cmd!("cypher-builder")
        .arg("--config")
        .arg(absent_config(&dir))
        .arg("render")
        .arg(&script)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8 stderr");
    assert!(stderr.contains("step 1 (or)"), "stderr: {stderr}");
}

#[test]
fn render_reads_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let output = cargo_bin_cmd!("cypher-builder")
        .arg("--config")
        .arg(absent_config(&dir))
        .args(["render", "-"])
        .write_stdin(r#"{"steps": [{"create": {"tag": "n", "labels": "Tag"}}, {"return": "n"}]}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        String::from_utf8(output).expect("utf8 stdout"),
        "CREATE (n:Tag)\nRETURN n;\n"
    );
}

#[test]
fn operators_lists_symbols() {
    let dir = TempDir::new().expect("tempdir");
    let output = cargo_bin_cmd!("cypher-builder")
        .arg("--config")
        .arg(absent_config(&dir))
        .args(["--format", "json", "operators"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    let symbols = json.as_array().expect("array");
    assert_eq!(symbols.len(), 12);
    assert!(symbols.iter().any(|s| s == "STARTS WITH"));
}
