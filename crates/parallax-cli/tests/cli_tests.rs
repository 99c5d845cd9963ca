// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const DESK: &str = "
(NewScreen desk 0)
(ScreenProperty desk PhysicalScreenWidth ${WIDTH})
(ScreenProperty desk PhysicalScreenHeight 0.29)
(NewView main)
(ViewProperty main Screen desk)
(ViewProperty main ViewPlatform rig)
(ViewProperty main StereoEnable true)
(ScreenProperty desk StereoAvailable true)
(NewViewPlatform rig)
";

fn write_config(dir: &tempfile::TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("desk.cfg");
    fs::write(&path, text).unwrap();
    path
}

fn parallax() -> Command {
    Command::cargo_bin("parallax").unwrap()
}

#[test]
fn check_passes_a_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, DESK);
    parallax()
        .args(["check", "--var", "WIDTH=0.36"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 rejected commands"));
}

#[test]
fn check_fails_and_lists_rejected_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "(NewScreen s 0)\n(ScreenProperty s Glow 1)\n");
    parallax()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("desk.cfg:2"))
        .stdout(predicate::str::contains("unknown Screen property `Glow`"));
}

#[test]
fn undefined_variables_abort() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, DESK);
    parallax()
        .arg("check")
        .arg(&path)
        .env_remove("WIDTH")
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined variable `WIDTH`"));
}

#[test]
fn inspect_prints_both_eyes_of_a_stereo_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, DESK);
    parallax()
        .args(["inspect", "--world"])
        .arg(&path)
        .env("WIDTH", "0.36")
        .assert()
        .success()
        .stdout(predicate::str::contains("main / desk (canvas#0)"))
        .stdout(predicate::str::contains("projection (right)"))
        .stdout(predicate::str::contains("right clip distances"))
        .stdout(predicate::str::contains("field of view: 45.00 deg"))
        .stdout(predicate::str::contains("view platform to world"));
}

#[test]
fn inspect_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, DESK);
    let output = parallax()
        .args(["inspect", "--json", "--var", "WIDTH=0.36"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &reports[0];
    assert_eq!(first["view"], "main");
    assert_eq!(first["canvas"], 0);
    let derived = &first["outcome"]["derived"];
    assert!(derived["physical_to_virtual_scale"].as_f64().unwrap() > 0.0);
    assert!((derived["field_of_view_degrees"].as_f64().unwrap() - 45.0).abs() < 1e-9);
    assert!(derived["front_clip_distance"]["right"].as_f64().unwrap() > 0.0);
    assert!(derived.get("world").is_none());
}
