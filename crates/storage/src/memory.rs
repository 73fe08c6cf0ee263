// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory snapshot store for tests

use crate::snapshot::Snapshot;
use crate::store::{SnapshotStore, StorageError};
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryState {
    current: Option<Snapshot>,
    saves: Vec<Snapshot>,
    fail_saves: bool,
    fail_loads: bool,
}

/// Snapshot store backed by memory; clones share state
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        store.lock().current = Some(snapshot);
        store
    }

    /// Make subsequent saves fail with an IO error
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Make subsequent loads fail with an IO error
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Every snapshot successfully saved, oldest first
    pub fn saves(&self) -> Vec<Snapshot> {
        self.lock().saves.clone()
    }

    /// The most recently saved (or primed) snapshot
    pub fn current(&self) -> Option<Snapshot> {
        self.lock().current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let state = self.lock();
        if state.fail_loads {
            return Err(io::Error::other("injected load failure").into());
        }
        Ok(state.current.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(io::Error::other("injected save failure").into());
        }
        state.current = Some(snapshot.clone());
        state.saves.push(snapshot.clone());
        Ok(())
    }
}
