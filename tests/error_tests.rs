//! Config command integration tests

use std::path::Path;
use std::process::Command;

fn audio_recorder_bin(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_audio-recorder"));
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = audio_recorder_bin(dir.path())
        .args(["config", "get", "unknown_key"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown") || stderr.contains("Valid"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = audio_recorder_bin(dir.path())
        .args(["config", "set", "unknown_key", "value"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown") || stderr.contains("Valid"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let output = audio_recorder_bin(dir.path())
        .args(["config", "set", "recorder.encoder", "mp3"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid encoder"),
        "Expected error about invalid encoder, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_boolean() {
    let dir = tempfile::tempdir().unwrap();
    let output = audio_recorder_bin(dir.path())
        .args(["config", "set", "recorder.auto_gain", "maybe"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("true") || stderr.contains("false"),
        "Expected error about invalid boolean, got: {}",
        stderr
    );
}

#[test]
fn config_list_with_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = audio_recorder_bin(dir.path())
        .args(["config", "list"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recorder.encoder"), "got: {}", stdout);
    assert!(stdout.contains("(not set)"), "got: {}", stdout);
}

#[test]
fn config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let set = audio_recorder_bin(dir.path())
        .args(["config", "set", "recorder.sample_rate", "16000"])
        .output()
        .expect("Failed to execute command");
    assert!(set.status.success());

    let get = audio_recorder_bin(dir.path())
        .args(["config", "get", "recorder.sample_rate"])
        .output()
        .expect("Failed to execute command");
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "16000");

    let file = dir.path().join("audio-recorder").join("config.toml");
    let content = std::fs::read_to_string(file).unwrap();
    assert!(content.contains("[recorder]"));
    assert!(content.contains("sample_rate = 16000"));
}

#[test]
fn config_init_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    let first = audio_recorder_bin(dir.path())
        .args(["config", "init"])
        .output()
        .expect("Failed to execute command");
    assert!(first.status.success());

    let second = audio_recorder_bin(dir.path())
        .args(["config", "init"])
        .output()
        .expect("Failed to execute command");
    assert!(!second.status.success());
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("already exists"), "got: {}", stderr);
}
