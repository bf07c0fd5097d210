// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the pomyard CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn write_pom(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn make_pom(group: &str, artifact: &str, version: &str, deps: &[(&str, &str, &str)]) -> String {
    let deps: String = deps
        .iter()
        .map(|(g, a, v)| {
            format!(
                "<dependency><groupId>{g}</groupId><artifactId>{a}</artifactId><version>{v}</version></dependency>"
            )
        })
        .collect();
    format!(
        "<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\
         <groupId>{group}</groupId><artifactId>{artifact}</artifactId><version>{version}</version>\
         <dependencies>{deps}</dependencies></project>"
    )
}

/// Workspace with `app -> lib` and a config file pointing at it
fn make_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_pom(
        dir.path(),
        "ws/app/pom.xml",
        &make_pom("org.acme", "app", "1.0", &[("org.acme", "lib", "2.0")]),
    );
    write_pom(dir.path(), "ws/lib/pom.xml", &make_pom("org.acme", "lib", "2.0", &[]));
    fs::write(
        dir.path().join("config.toml"),
        "group_id_base = \"org.acme\"\nfetch_timeout_secs = 5\n",
    )
    .unwrap();
    dir
}

/// `pomyard --offline --no-color -c <dir>/config.toml -w <dir>/ws`
fn pomyard(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pomyard").unwrap();
    cmd.env_remove("POMYARD_WORKSPACE")
        .env_remove("POMYARD_CONFIG")
        .arg("--offline")
        .arg("--no-color")
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-w")
        .arg(dir.path().join("ws"));
    cmd
}

// =============================================================================
// General
// =============================================================================

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("pomyard")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("document"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("versions"));
}

#[test]
fn test_completions_bash() {
    Command::cargo_bin("pomyard")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pomyard"));
}

#[test]
fn test_config_shows_file_values() {
    let dir = make_workspace();
    pomyard(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("group_id_base = \"org.acme\""))
        .stdout(predicate::str::contains("fetch_timeout_secs = 5"));

    pomyard(&dir)
        .args(["config", "max_sweeps"])
        .assert()
        .success()
        .stdout("32\n");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = make_workspace();
    pomyard(&dir)
        .args(["config", "no_such_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("pomyard")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("absent.toml"))
        .arg("config")
        .assert()
        .failure();
}

// =============================================================================
// Workspace Commands
// =============================================================================

#[test]
fn test_document_marks_local_copies() {
    let dir = make_workspace();
    pomyard(&dir)
        .arg("document")
        .assert()
        .success()
        .stdout(predicate::str::contains("ArtifactId: app"))
        .stdout(predicate::str::contains("LOCAL ENVIRONMENT COPY"));
}

#[test]
fn test_document_writes_output_file() {
    let dir = make_workspace();
    let out = dir.path().join("doc.txt");
    pomyard(&dir).arg("document").arg("-o").arg(&out).assert().success();

    let text = fs::read_to_string(out).unwrap();
    assert!(text.contains("GroupId: org.acme"));
}

#[test]
fn test_check_prints_tree() {
    let dir = make_workspace();
    pomyard(&dir)
        .args(["check", "--parent", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("lib"));
}

#[test]
fn test_check_reports_wrong_version() {
    let dir = make_workspace();
    write_pom(
        dir.path(),
        "ws/lib/pom.xml",
        &make_pom("org.acme", "lib", "1.9", &[]),
    );
    pomyard(&dir)
        .args(["check", "-p", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("incorrect dependency version present"))
        .stdout(predicate::str::contains("1.9"));
}

#[test]
fn test_check_ambiguous_parent_fails() {
    let dir = make_workspace();
    write_pom(dir.path(), "ws/one/pom.xml", &make_pom("org.acme.one", "common", "1", &[]));
    write_pom(dir.path(), "ws/two/pom.xml", &make_pom("org.acme.two", "common", "1", &[]));

    pomyard(&dir)
        .args(["check", "-p", "common"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot use 'common'"));
}

#[test]
fn test_check_unknown_parent_fails() {
    let dir = make_workspace();
    pomyard(&dir)
        .args(["check", "-p", "nothing-here"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_workspace_fails() {
    let dir = make_workspace();
    Command::cargo_bin("pomyard")
        .unwrap()
        .env_remove("POMYARD_WORKSPACE")
        .arg("--offline")
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-w")
        .arg(dir.path().join("missing"))
        .arg("document")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve workspace"));
}

#[test]
fn test_export_json() {
    let dir = make_workspace();
    let assert = pomyard(&dir)
        .args(["export", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["edges"].as_array().unwrap().len(), 1);
}

#[test]
fn test_export_dot() {
    let dir = make_workspace();
    pomyard(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph poms"));
}
