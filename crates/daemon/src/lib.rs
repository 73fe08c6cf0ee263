// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollover daemon
//!
//! Admission control for a pool of workers: a fixed number of capacity
//! slots, leased to TCP clients that keep them alive with heartbeats.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod admin;
pub mod connection;
pub mod coordinator;
pub mod lifecycle;
pub mod scheduler;

pub use admin::{handle_admin, AdminError};
pub use connection::{handle_connection, ConnectionError, GRANTED, PING};
pub use coordinator::{
    AcquireError, AcquireRequest, Control, Coordinator, CoordinatorConfig, CoordinatorGone,
    Intake,
};
pub use lifecycle::{startup, Config, Daemon, LifecycleError};
pub use scheduler::{spawn_periodic, SchedulerConfig};
