// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rollover-core: domain types for the rollover admission service
//!
//! This crate provides:
//! - The lease table (capacity ceiling plus held leases)
//! - Typed administrative commands and their admin-endpoint replies
//! - Clock abstraction for deterministic expiry tests

pub mod clock;
pub mod command;
pub mod lease;
pub mod reply;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{Command, CommandParseError};
pub use lease::{Grant, LeaseTable, Status, LEASE_TTL};
pub use reply::AdminReply;
