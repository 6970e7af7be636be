//! Integration tests for the command-line interface.

use std::process::Command;

use tempfile::TempDir;

fn sambahayan_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sambahayan"))
}

#[test]
fn test_version_command() {
    let output = sambahayan_bin()
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sambahayan"));
}

#[test]
fn test_help_lists_commands() {
    let output = sambahayan_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("stats"));
}

#[test]
fn test_init_creates_config_and_databases() {
    let dir = TempDir::new().unwrap();

    let output = sambahayan_bin()
        .arg("init")
        .arg("--path")
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(dir.path().join("sambahayan.toml").exists());
    assert!(dir.path().join(".sambahayan/registry.db").exists());
    assert!(dir.path().join(".sambahayan/learning.db").exists());

    // Re-running must not clobber the existing configuration.
    let again = sambahayan_bin()
        .arg("init")
        .arg("--path")
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");
    assert!(again.status.success());
    let stdout = String::from_utf8_lossy(&again.stdout);
    assert!(stdout.contains("already exists"));
}

#[test]
fn test_stats_on_fresh_install() {
    let dir = TempDir::new().unwrap();

    let init = sambahayan_bin()
        .arg("init")
        .arg("--path")
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");
    assert!(init.status.success());

    let output = sambahayan_bin()
        .current_dir(dir.path())
        .arg("stats")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Families recorded"));
    assert!(stdout.contains("0"));
}
