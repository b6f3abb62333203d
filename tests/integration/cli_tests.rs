//! CLI integration tests
//!
//! These tests verify that the CLI handles its early exits correctly. None of
//! them need a real language server.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("dartdeadcode").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Temp project with the given files
fn project(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for rel in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "class A {}\n").unwrap();
    }
    dir
}

fn root_arg(dir: &Path) -> String {
    dir.to_string_lossy().to_string()
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-references"))
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--log-file"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_folders_without_terminal_aborts() {
    let dir = project(&["lib/main.dart"]);

    cli()
        .args(["--root", &root_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("No folders selected – aborting."));
}

#[test]
fn test_no_dart_files() {
    let dir = project(&["README.md"]);

    cli()
        .args(["--root", &root_arg(dir.path()), &root_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No .dart files found in the selected folders.",
        ));
}

#[test]
fn test_only_generated_files() {
    let dir = project(&["lib/model.g.dart", "lib/model.freezed.dart"]);

    cli()
        .args(["--root", &root_arg(dir.path()), &root_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("No .dart files found"));
}

#[test]
fn test_extension_changes_message() {
    let dir = project(&["lib/main.dart"]);

    cli()
        .args(["--root", &root_arg(dir.path())])
        .args(["--extension", "kt", &root_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("No .kt files found"));
}

#[test]
fn test_missing_language_server() {
    let dir = project(&["lib/main.dart"]);

    cli()
        .args(["--root", &root_arg(dir.path())])
        .args(["--server", "/nonexistent/dart-language-server --protocol=lsp"])
        .arg(root_arg(dir.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to start the language server"));
}

#[test]
fn test_invalid_config_file() {
    let dir = project(&["lib/main.dart"]);
    let config = dir.path().join("broken.yml");
    std::fs::write(&config, "extensions: [dart\n").unwrap();

    cli()
        .args(["--root", &root_arg(dir.path())])
        .args(["--config", &root_arg(&config)])
        .arg(root_arg(dir.path()))
        .assert()
        .failure();
}

#[test]
fn test_config_file_is_picked_up_from_root() {
    let dir = project(&["lib/main.kt"]);
    std::fs::write(dir.path().join(".deadcode.yml"), "extensions: [swift]\n").unwrap();

    cli()
        .args(["--root", &root_arg(dir.path()), &root_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("No .swift files found"));
}

#[test]
fn test_invalid_root() {
    cli()
        .args(["--root", "/nonexistent/project/root", "lib"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project root"));
}

#[test]
fn test_unknown_format_rejected() {
    cli().args(["--format", "sarif", "."]).assert().failure();
}
