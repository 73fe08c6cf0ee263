// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease table: capacity plus the set of held leases
//!
//! The admission invariant `in_use <= capacity` is checked only when granting.
//! Lowering capacity below the current lease count evicts nobody; new grants
//! stay blocked until enough leases are released or expire.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// How long a lease survives without a heartbeat
pub const LEASE_TTL: Duration = Duration::from_secs(60);

/// Capacity and lease usage at a point in time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub capacity: u32,
    pub in_use: usize,
    pub available: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "capacity: {}", self.capacity)?;
        writeln!(f, "slots in use: {}", self.in_use)?;
        write!(f, "available slots: {}", self.available)
    }
}

/// Outcome of granting a lease
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    /// A new lease was created
    Created,
    /// The identity already held a lease; its timestamp was refreshed
    Coalesced,
}

/// Capacity ceiling and leases keyed by client identity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeaseTable {
    capacity: u32,
    leases: HashMap<String, DateTime<Utc>>,
}

impl LeaseTable {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            leases: HashMap::new(),
        }
    }

    /// Rebuild a table from persisted parts
    pub fn from_parts(capacity: u32, leases: HashMap<String, DateTime<Utc>>) -> Self {
        Self { capacity, leases }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of leases currently held
    pub fn in_use(&self) -> usize {
        self.leases.len()
    }

    /// Free slots; zero when capacity was lowered below usage
    pub fn available(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.leases.len())
    }

    pub fn can_grant(&self) -> bool {
        self.available() > 0
    }

    pub fn holds(&self, identity: &str) -> bool {
        self.leases.contains_key(identity)
    }

    /// Last liveness timestamp for an identity
    pub fn last_seen(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.leases.get(identity).copied()
    }

    pub fn leases(&self) -> &HashMap<String, DateTime<Utc>> {
        &self.leases
    }

    pub fn status(&self) -> Status {
        Status {
            capacity: self.capacity,
            in_use: self.in_use(),
            available: self.available(),
        }
    }

    /// Record a lease for `identity`
    ///
    /// Callers check [`can_grant`](Self::can_grant) first. A duplicate
    /// identity coalesces with the existing entry.
    pub fn grant(&mut self, identity: &str, now: DateTime<Utc>) -> Grant {
        match self.leases.insert(identity.to_string(), now) {
            Some(_) => Grant::Coalesced,
            None => Grant::Created,
        }
    }

    /// Refresh the liveness timestamp of a held lease
    ///
    /// Returns false (and changes nothing) if the identity holds no lease.
    pub fn heartbeat(&mut self, identity: &str, now: DateTime<Utc>) -> bool {
        match self.leases.get_mut(identity) {
            Some(last_seen) => {
                *last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Remove a lease; returns whether one was held
    pub fn release(&mut self, identity: &str) -> bool {
        self.leases.remove(identity).is_some()
    }

    /// Remove every lease last seen strictly before `now - ttl`
    ///
    /// Returns the expired identities, sorted.
    pub fn expire(&mut self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        let Some(cutoff) = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
        else {
            return Vec::new();
        };
        let mut expired: Vec<String> = self
            .leases
            .iter()
            .filter(|(_, last_seen)| **last_seen < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();

        for id in &expired {
            self.leases.remove(id);
        }
        expired
    }

    pub fn inc_capacity(&mut self) {
        self.capacity = self.capacity.saturating_add(1);
    }

    pub fn dec_capacity(&mut self) {
        self.capacity = self.capacity.saturating_sub(1);
    }

    /// Set capacity, clamped to `0..=u32::MAX`
    pub fn set_capacity(&mut self, capacity: i64) {
        self.capacity = u32::try_from(capacity.max(0)).unwrap_or(u32::MAX);
    }

    /// Reset every lease's liveness to `now`
    ///
    /// Used after loading a snapshot so that holders from before a restart
    /// get a full TTL to resume heartbeating.
    pub fn reset_timestamps(&mut self, now: DateTime<Utc>) {
        for last_seen in self.leases.values_mut() {
            *last_seen = now;
        }
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
