//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn audio_recorder_bin() -> Command {
    let mut cmd = Command::cargo_bin("audio-recorder").expect("binary should build");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    audio_recorder_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("permission"))
        .stdout(predicate::str::contains("encoders"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn record_help_lists_options() {
    audio_recorder_bin()
        .args(["record", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--duration"))
        .stdout(predicate::str::contains("--encoder"))
        .stdout(predicate::str::contains("--sample-rate"))
        .stdout(predicate::str::contains("--suppress-noise"))
        .stdout(predicate::str::contains("--auto-gain"));
}

#[test]
fn version_output() {
    audio_recorder_bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("audio-recorder"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_is_usage_error() {
    audio_recorder_bin().assert().code(2);
}

#[test]
fn config_path_command() {
    let dir = tempfile::tempdir().unwrap();
    audio_recorder_bin()
        .args(["config", "path"])
        .env("XDG_CONFIG_HOME", dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("audio-recorder"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_help() {
    audio_recorder_bin()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn invalid_duration_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    audio_recorder_bin()
        .args(["record", "--duration", "invalid"])
        .env("XDG_CONFIG_HOME", dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn invalid_encoder_is_usage_error() {
    audio_recorder_bin()
        .args(["record", "--encoder", "mp3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mp3"));
}

#[test]
fn invalid_channels_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    audio_recorder_bin()
        .args(["record", "--channels", "3"])
        .env("XDG_CONFIG_HOME", dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("channels"));
}

#[test]
fn invalid_timeout_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    audio_recorder_bin()
        .args(["encoders", "--timeout", "soon"])
        .env("XDG_CONFIG_HOME", dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn encoders_lists_every_encoder() {
    let dir = tempfile::tempdir().unwrap();
    audio_recorder_bin()
        .arg("encoders")
        .env("XDG_CONFIG_HOME", dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wav"))
        .stdout(predicate::str::contains("flac"))
        .stdout(predicate::str::contains("pcm16bits"))
        .stdout(predicate::str::contains("aacLc"))
        .stdout(predicate::str::contains("amrWb"));
}
