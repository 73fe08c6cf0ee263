// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `rollover admin`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::TestDaemon;
use predicates::prelude::*;

fn rollover(daemon: &TestDaemon) -> Command {
    let mut cmd = Command::cargo_bin("rollover").unwrap();
    cmd.env("ROLLOVER_ADMIN_ADDR", daemon.admin_addr())
        .env("ROLLOVER_ADDR", daemon.addr());
    cmd
}

#[test]
fn admin_help_lists_commands() {
    Command::cargo_bin("rollover")
        .unwrap()
        .args(["admin", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inc-capacity"))
        .stdout(predicate::str::contains("dec-capacity"))
        .stdout(predicate::str::contains("set-capacity"))
        .stdout(predicate::str::contains("persist"));
}

#[test]
fn status_prints_operator_lines() {
    let daemon = TestDaemon::start(3);

    rollover(&daemon)
        .args(["admin", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity: 3"))
        .stdout(predicate::str::contains("slots in use: 0"))
        .stdout(predicate::str::contains("available slots: 3"));
}

#[test]
fn capacity_changes_are_reported() {
    let daemon = TestDaemon::start(1);

    rollover(&daemon)
        .args(["admin", "inc-capacity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity: 2"));

    rollover(&daemon)
        .args(["admin", "set-capacity", "-4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity: 0"));

    rollover(&daemon)
        .args(["admin", "dec-capacity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity: 0"));
}

#[test]
fn json_output_is_parseable() {
    let daemon = TestDaemon::start(2);

    let output = rollover(&daemon)
        .args(["admin", "--output", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["capacity"], 2);
    assert_eq!(value["available"], 2);
}

#[test]
fn persist_writes_state_file() {
    let daemon = TestDaemon::start(4);

    rollover(&daemon)
        .args(["admin", "persist"])
        .assert()
        .success();

    let raw = std::fs::read_to_string(daemon.state_dir.path().join("state.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved["Capacity"], 4);
}

#[test]
fn unreachable_daemon_fails_with_message() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    Command::cargo_bin("rollover")
        .unwrap()
        .args(["admin", "--admin-addr", &addr, "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not reachable"));
}
