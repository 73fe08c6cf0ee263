// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic maintenance commands
//!
//! Each periodic command gets its own ticker task feeding the same control
//! intake operators use; there is no priority between them.

use std::time::Duration;

use rollover_core::Command;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::coordinator::Intake;

/// Intervals for the periodic commands
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub status: Duration,
    pub persist: Duration,
    pub expire: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(5),
            persist: Duration::from_secs(10),
            expire: Duration::from_secs(2),
        }
    }
}

impl SchedulerConfig {
    fn schedule(&self) -> [(Command, Duration); 3] {
        [
            (Command::Status, self.status),
            (Command::Persist, self.persist),
            (Command::Expire, self.expire),
        ]
    }
}

/// Spawn one ticker task per periodic command
///
/// Tasks stop on their own once the coordinator is gone.
pub fn spawn_periodic(intake: &Intake, config: &SchedulerConfig) -> Vec<JoinHandle<()>> {
    config
        .schedule()
        .into_iter()
        .map(|(command, period)| tokio::spawn(periodic(intake.clone(), command, period)))
        .collect()
}

async fn periodic(intake: Intake, command: Command, period: Duration) {
    // First firing one full period after start
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if intake.command(command).await.is_err() {
            debug!(%command, "coordinator gone, stopping periodic command");
            break;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
