// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted coordinator snapshot
//!
//! On disk the snapshot is a single JSON object:
//!
//! ```json
//! {"Capacity":2,"Locks":{"worker-1":"2026-01-01T00:00:00Z"}}
//! ```

use chrono::{DateTime, Utc};
use rollover_core::LeaseTable;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Capacity plus lease timestamps, as written to the state file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "Capacity", default)]
    pub capacity: i64,
    #[serde(rename = "Locks", default, deserialize_with = "null_as_empty")]
    pub locks: BTreeMap<String, DateTime<Utc>>,
}

impl Snapshot {
    /// Capture the current state of a lease table
    pub fn capture(table: &LeaseTable) -> Self {
        Self {
            capacity: i64::from(table.capacity()),
            locks: table
                .leases()
                .iter()
                .map(|(id, last_seen)| (id.clone(), *last_seen))
                .collect(),
        }
    }

    /// Rebuild a lease table, resetting every lease's liveness to `now`
    pub fn restore(self, now: DateTime<Utc>) -> LeaseTable {
        let mut table = LeaseTable::from_parts(0, self.locks.into_iter().collect());
        table.set_capacity(self.capacity);
        table.reset_timestamps(now);
        table
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, DateTime<Utc>>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
