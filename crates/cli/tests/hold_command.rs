// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `rollover hold`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::TestDaemon;
use predicates::prelude::*;

#[test]
fn hold_runs_command_while_slot_is_held() {
    let daemon = TestDaemon::start(1);

    Command::cargo_bin("rollover")
        .unwrap()
        .args(["hold", "--id", "job-1", "--addr", &daemon.addr(), "--", "true"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("acquired job-1"))
        .stdout(predicate::str::contains("released"));
}

#[test]
fn hold_propagates_command_exit_code() {
    let daemon = TestDaemon::start(1);

    Command::cargo_bin("rollover")
        .unwrap()
        .args(["hold", "--addr", &daemon.addr(), "--", "sh", "-c", "exit 3"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(3);
}

#[test]
fn released_slot_is_reusable() {
    let daemon = TestDaemon::start(1);

    for id in ["first", "second"] {
        Command::cargo_bin("rollover")
            .unwrap()
            .args(["hold", "--id", id, "--addr", &daemon.addr(), "--", "true"])
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("acquired {}", id)));
    }
}

#[test]
fn zero_interval_is_rejected() {
    Command::cargo_bin("rollover")
        .unwrap()
        .args(["hold", "--interval", "0"])
        .assert()
        .failure();
}
