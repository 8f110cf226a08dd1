//! Integration tests for the gymlog binary.
//!
//! These tests verify end-to-end behavior including:
//! - Routine form modes (new, edit, rejected values)
//! - Workout logging, PR marking and archiving
//! - Preferences, statistics and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI bound to `data_dir`, with config lookups isolated from the real home
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gymlog"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn read_json(path: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(path).expect("Failed to read JSON file");
    serde_json::from_str(&contents).expect("Invalid JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("gymlog"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout tracker"));
}

#[test]
fn test_default_command_lists_seed_routines() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("r1  Full Body"))
        .stdout(predicate::str::contains("r2  Cardio & Abs"))
        .stdout(predicate::str::contains("Squat, Bench Press"));

    // Listing never writes the seeds
    assert!(!temp_dir.path().join("routines.json").exists());
}

#[test]
fn test_routine_save_without_mode_creates() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["routine", "save", "--name", "Leg Day", "--exercises", "sen,pren,ext"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created routine Leg Day"));

    let routines = read_json(&data_dir.join("routines.json"));
    let routines = routines.as_array().unwrap();
    assert_eq!(routines.len(), 3);
    assert_eq!(routines[0]["id"], "r1");
    assert_eq!(routines[2]["name"], "Leg Day");
    assert_eq!(
        routines[2]["exercises"],
        serde_json::json!(["sen", "pren", "ext"])
    );
}

#[test]
fn test_routine_save_edit_mode_keeps_id() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["routine", "save", "--mode", "edit", "--id", "r1", "--name", "Upper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated routine Upper (r1)"));

    let routines = read_json(&data_dir.join("routines.json"));
    let routines = routines.as_array().unwrap();
    assert_eq!(routines.len(), 2);
    assert_eq!(routines[0]["id"], "r1");
    assert_eq!(routines[0]["name"], "Upper");
    assert_eq!(
        routines[0]["exercises"],
        serde_json::json!(["sen", "bp", "rem", "pmil", "cinta"])
    );
}

#[test]
fn test_routine_save_unsupported_mode_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["routine", "save", "--mode", "clone", "--name", "X", "--exercises", "sen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'clone'"));

    assert!(!data_dir.join("routines.json").exists());
}

#[test]
fn test_routine_save_edit_unknown_routine() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["routine", "save", "--mode", "edit", "--id", "nope", "--name", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("routine nope"));
}

#[test]
fn test_routine_save_unknown_exercise() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["routine", "save", "--name", "X", "--exercises", "sen,moon_walk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("moon_walk"));
}

#[test]
fn test_routine_delete() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["routine", "delete", "r2"])
        .assert()
        .success();

    cli(data_dir)
        .arg("routines")
        .assert()
        .success()
        .stdout(predicate::str::contains("Full Body"))
        .stdout(predicate::str::contains("Cardio & Abs").not());
}

#[test]
fn test_full_workout_is_archived() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["start", "r1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started Full Body"));
    assert!(data_dir.join("active_workout.json").exists());

    cli(data_dir)
        .args(["log", "sen", "100", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat: 100 × 5"))
        .stdout(predicate::str::contains("PR"));

    cli(data_dir)
        .args(["log", "cinta", "10", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR").not());

    cli(data_dir)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved Full Body: 2 sets"));

    assert!(!data_dir.join("active_workout.json").exists());
    let log = fs::read_to_string(data_dir.join("sessions.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);

    let session: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(session["routineName"], "Full Body");
    assert_eq!(session["logs"]["sen"][0]["isPR"], true);
    assert!(session["logs"]["cinta"][0].get("isPR").is_none());

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Full Body"));
}

#[test]
fn test_pr_compares_with_previous_sessions() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "bp", "80", "5"]).assert().success();
    cli(data_dir).arg("finish").assert().success();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir)
        .args(["log", "bp", "80", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR").not());
    cli(data_dir)
        .args(["log", "bp", "85", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR"));
}

#[test]
fn test_unplanned_exercise_needs_add() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r2"]).assert().success();

    cli(data_dir)
        .args(["log", "curlb", "30", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("add it first"));

    cli(data_dir)
        .args(["add", "curlb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added curlb"));

    cli(data_dir)
        .args(["log", "curlb", "30", "10"])
        .assert()
        .success();

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Barbell Curl [curlb]"))
        .stdout(predicate::str::contains("1. 30 × 10"));
}

#[test]
fn test_undo_removes_set() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "sen", "100", "5"]).assert().success();
    cli(data_dir).args(["log", "sen", "110", "3"]).assert().success();

    cli(data_dir)
        .args(["undo", "sen", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 100 × 5"));

    cli(data_dir)
        .args(["undo", "sen", "0"])
        .assert()
        .failure();

    cli(data_dir)
        .args(["undo", "sen", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only 1 logged"));
}

#[test]
fn test_start_twice_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir)
        .args(["start", "r2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in progress"));
}

#[test]
fn test_cancel_discards_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .arg("cancel")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout in progress"));

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "sen", "100", "5"]).assert().success();
    cli(data_dir)
        .arg("cancel")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout discarded"));

    assert!(!data_dir.join("sessions.jsonl").exists());
    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout in progress"));
}

#[test]
fn test_custom_exercise_usable_in_routine() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["exercise", "add", "--id", "sled", "--name", "Sled Push", "--muscle", "legs"])
        .assert()
        .success();

    cli(data_dir)
        .args(["exercises", "--muscle", "Legs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sled Push"));

    cli(data_dir)
        .args(["routine", "save", "--name", "Sled", "--exercises", "sled"])
        .assert()
        .success();
}

#[test]
fn test_prefs_update_and_validation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("weekly_goal = 4"))
        .stdout(predicate::str::contains("rest_timer  = 90s"));

    cli(data_dir)
        .args(["prefs", "--weekly-goal", "3", "--lang", "en", "--rest-timer", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("weekly_goal = 3"));

    let prefs = read_json(&data_dir.join("preferences.json"));
    assert_eq!(prefs["weeklyGoal"], 3);
    assert_eq!(prefs["lang"], "en");
    assert_eq!(prefs["restTimerDefault"], 120);

    cli(data_dir)
        .args(["prefs", "--rest-timer", "45"])
        .assert()
        .failure();
    cli(data_dir)
        .args(["prefs", "--weekly-goal", "8"])
        .assert()
        .failure();
}

#[test]
fn test_stats_and_export() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "sen", "100", "5"]).assert().success();
    cli(data_dir).args(["log", "bp", "60", "10"]).assert().success();
    cli(data_dir).arg("finish").assert().success();

    cli(data_dir)
        .args(["stats", "--range", "1W"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions:     1"))
        .stdout(predicate::str::contains("Volume:       1100 kg"))
        .stdout(predicate::str::contains("Streak"));

    cli(data_dir)
        .args(["stats", "--range", "2W"])
        .assert()
        .failure();

    let csv_path = data_dir.join("export").join("history.csv");
    cli(data_dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 sets"));

    let csv_content = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_content.starts_with("session_id,date,routine_name"));
    assert_eq!(csv_content.lines().count(), 3);
}

#[test]
fn test_status_lists_repeated_exercise_once() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["routine", "save", "--mode", "edit", "--id", "r1", "--exercises", "sen,bp,sen"])
        .assert()
        .success();
    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "sen", "100", "5"]).assert().success();

    let output = cli(data_dir).arg("status").output().expect("status did not run");
    let stdout = String::from_utf8(output.stdout).expect("status output is not UTF-8");
    assert_eq!(stdout.matches("[sen]").count(), 1);
    assert_eq!(stdout.matches("1. 100 × 5").count(), 1);
}

#[test]
fn test_session_delete() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir).args(["log", "sen", "100", "5"]).assert().success();
    cli(data_dir).arg("finish").assert().success();

    let line = fs::read_to_string(data_dir.join("sessions.jsonl")).expect("No session log");
    let session: serde_json::Value = serde_json::from_str(line.trim()).expect("Invalid session");
    let id = session["id"].as_str().expect("Session has no id").to_string();

    cli(data_dir)
        .args(["session", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Deleted session {}", id)));
    cli(data_dir)
        .args(["session", "delete", &id])
        .assert()
        .failure();
    cli(data_dir)
        .args(["history", "--range", "1Y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));
}

#[test]
fn test_weights_with_units_count_for_records() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir)
        .args(["log", "bp", "80kg", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR"));
    cli(data_dir).arg("finish").assert().success();

    cli(data_dir).args(["start", "r1"]).assert().success();
    cli(data_dir)
        .args(["log", "bp", "80 kg", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR").not());
    cli(data_dir)
        .args(["log", "bp", "82.5kg", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR"));
}
