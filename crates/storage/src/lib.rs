// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistence adapter for coordinator snapshots

mod snapshot;
mod store;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use snapshot::Snapshot;
pub use store::{FileSnapshotStore, SnapshotStore, StorageError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemorySnapshotStore;
