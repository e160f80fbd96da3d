//! End-to-end tests of the `tw` command-line interface.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"name: The Haunting
rule_system: coc7e
characters:
  player1:
    id: player1
    name: Thomas
    type: player
    control: human
    state:
      hp: 11
  gm:
    id: gm
    name: Keeper
    type: gm
    control: ai
initial_state:
  counter: 0
  clues: []
"#;

fn tw() -> Command {
    Command::cargo_bin("tw").unwrap()
}

/// Create a temp directory with a valid configuration file.
fn test_config() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("haunting.yaml");
    fs::write(&path, CONFIG).unwrap();
    (dir, path)
}

/// Play a short scripted session and return the saved session path.
fn played_session(dir: &Path, config: &Path) -> PathBuf {
    let save = dir.join("session.json");
    tw().args(["play", "--seed", "7", "--save"])
        .arg(&save)
        .arg(config)
        .write_stdin("say gm Hello there\nupdate counter add 3\nturn player1\nroll 1d100 50\nquit\n")
        .assert()
        .success();
    save
}

fn event_ids(session: &Path) -> Vec<String> {
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(session).unwrap()).unwrap();
    json["event_history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_config() {
    let (_dir, config) = test_config();
    tw().arg("check")
        .arg(&config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed for 'The Haunting'")
                .and(predicate::str::contains("2 characters"))
                .and(predicate::str::contains("Thomas")),
        );
}

#[test]
fn check_rejects_mismatched_character_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"name": "Bad", "rule_system": "generic",
            "characters": {"a": {"id": "b", "name": "B", "type": "npc", "control": "ai"}}}"#,
    )
    .unwrap();
    tw().arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("invalid config")));
}

#[test]
fn check_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campaign.toml");
    fs::write(&path, "name = 'x'").unwrap();
    tw().arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported config format"));
}

#[test]
fn check_missing_file() {
    tw().args(["check", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// ---------------------------------------------------------------------------
// play / resume
// ---------------------------------------------------------------------------

#[test]
fn play_runs_commands_and_saves() {
    let (dir, config) = test_config();
    let save = dir.path().join("session.json");
    tw().args(["play", "--seed", "7", "--save"])
        .arg(&save)
        .arg(&config)
        .write_stdin("say gm Hello there\nupdate counter add 3\ndance\nquit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("gm: Hello there")
                .and(predicate::str::contains("counter = 3"))
                .and(predicate::str::contains("unknown command: dance"))
                .and(predicate::str::contains("Session saved")),
        );
    assert_eq!(event_ids(&save).len(), 3);
}

#[test]
fn play_save_command_writes_file() {
    let (dir, config) = test_config();
    let target = dir.path().join("manual.json");
    tw().arg("play")
        .arg(&config)
        .write_stdin(format!("say gm Hi\nsave {}\nquit\n", target.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved to"));
    assert_eq!(event_ids(&target).len(), 2);
}

#[test]
fn resume_appends_to_saved_session() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    let before = event_ids(&save).len();

    tw().arg("resume")
        .arg(&save)
        .write_stdin("say player1 I open the door.\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resuming").and(predicate::str::contains("player1: I open the door.")));
    assert_eq!(event_ids(&save).len(), before + 1);
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

#[test]
fn replay_prints_derived_state() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("replay")
        .arg(&save)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"counter\": 3")
                .and(predicate::str::contains("\"current_turn\": 1"))
                .and(predicate::str::contains("Hello there")),
        );
}

#[test]
fn replay_to_event() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    let ids = event_ids(&save);
    tw().arg("replay")
        .arg(&save)
        .args(["--to", &ids[1]])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"counter\": 0")
                .and(predicate::str::contains("Hello there")),
        );
}

#[test]
fn replay_unknown_event_fails() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("replay")
        .arg(&save)
        .args(["--to", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("event not found: nope"));
}

#[test]
fn replay_at_time_before_start_is_initial_state() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("replay")
        .arg(&save)
        .args(["--at", "2000-01-01T00:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"counter\": 0").and(predicate::str::contains("\"messages\": []")));
}

#[test]
fn replay_rejects_bad_timestamp() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("replay")
        .arg(&save)
        .args(["--at", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timestamp"));
}

#[test]
fn replay_trace_lists_changes() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("replay")
        .arg(&save)
        .arg("--trace")
        .assert()
        .success()
        .stdout(predicate::str::contains("counter").and(predicate::str::contains("1 changes")));
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

#[test]
fn history_lists_all_events() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("history")
        .arg(&save)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("game_start")
                .and(predicate::str::contains("dice_roll"))
                .and(predicate::str::contains("5 of 5 events")),
        );
}

#[test]
fn history_filters_by_type_and_actor() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("history")
        .arg(&save)
        .args(["--type", "message"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello there").and(predicate::str::contains("1 of 5 events")));

    tw().arg("history")
        .arg(&save)
        .args(["--actor", "player1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 5 events"));
}

#[test]
fn history_rejects_unknown_type() {
    let (dir, config) = test_config();
    let save = played_session(dir.path(), &config);
    tw().arg("history")
        .arg(&save)
        .args(["--type", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid event type: teleport"));
}
