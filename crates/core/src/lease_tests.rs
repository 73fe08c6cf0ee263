// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use proptest::prelude::*;
use yare::parameterized;

fn table_with(capacity: u32, holders: &[&str], clock: &FakeClock) -> LeaseTable {
    let mut table = LeaseTable::new(capacity);
    for holder in holders {
        table.grant(holder, clock.now());
    }
    table
}

#[test]
fn new_table_has_full_capacity() {
    let table = LeaseTable::new(3);
    assert_eq!(table.available(), 3);
    assert_eq!(table.in_use(), 0);
    assert!(table.can_grant());
}

#[test]
fn zero_capacity_never_grants() {
    let table = LeaseTable::default();
    assert!(!table.can_grant());
    assert_eq!(table.available(), 0);
}

#[test]
fn grant_consumes_a_slot() {
    let clock = FakeClock::new();
    let table = table_with(2, &["a"], &clock);

    assert!(table.holds("a"));
    assert_eq!(table.available(), 1);
    assert_eq!(table.last_seen("a"), Some(clock.now()));
}

#[test]
fn duplicate_identity_coalesces() {
    let clock = FakeClock::new();
    let mut table = table_with(2, &["a"], &clock);

    clock.advance(Duration::from_secs(5));
    assert_eq!(table.grant("a", clock.now()), Grant::Coalesced);
    assert_eq!(table.in_use(), 1);
    assert_eq!(table.last_seen("a"), Some(clock.now()));
}

#[test]
fn heartbeat_refreshes_held_lease() {
    let clock = FakeClock::new();
    let mut table = table_with(1, &["a"], &clock);

    clock.advance(Duration::from_secs(30));
    assert!(table.heartbeat("a", clock.now()));
    assert_eq!(table.last_seen("a"), Some(clock.now()));
}

#[test]
fn heartbeat_never_creates_a_lease() {
    let clock = FakeClock::new();
    let mut table = LeaseTable::new(5);

    assert!(!table.heartbeat("ghost", clock.now()));
    assert!(!table.holds("ghost"));
    assert_eq!(table.in_use(), 0);
}

#[test]
fn release_unknown_identity_is_noop() {
    let clock = FakeClock::new();
    let mut table = table_with(2, &["a"], &clock);

    assert!(!table.release("b"));
    assert!(table.release("a"));
    assert!(!table.release("a"));
    assert_eq!(table.in_use(), 0);
}

#[test]
fn expire_removes_only_stale_leases() {
    let clock = FakeClock::new();
    let mut table = table_with(3, &["old"], &clock);

    clock.advance(Duration::from_secs(45));
    table.grant("fresh", clock.now());
    clock.advance(Duration::from_secs(30));

    let expired = table.expire(clock.now(), LEASE_TTL);
    assert_eq!(expired, vec!["old".to_string()]);
    assert!(table.holds("fresh"));
    assert!(!table.holds("old"));
}

#[test]
fn expire_keeps_lease_exactly_at_ttl() {
    let clock = FakeClock::new();
    let mut table = table_with(1, &["edge"], &clock);

    clock.advance(LEASE_TTL);
    assert!(table.expire(clock.now(), LEASE_TTL).is_empty());

    clock.advance(Duration::from_millis(1));
    assert_eq!(table.expire(clock.now(), LEASE_TTL), vec!["edge".to_string()]);
}

#[test]
fn lowering_capacity_does_not_evict() {
    let clock = FakeClock::new();
    let mut table = table_with(2, &["a", "b"], &clock);

    table.dec_capacity();
    assert_eq!(table.capacity(), 1);
    assert_eq!(table.in_use(), 2);
    assert_eq!(table.available(), 0);
    assert!(!table.can_grant());

    table.release("a");
    assert!(!table.can_grant());
    table.release("b");
    assert!(table.can_grant());
}

#[parameterized(
    positive = { 4, 4 },
    zero = { 0, 0 },
    negative = { -3, 0 },
    huge = { i64::MAX, u32::MAX },
)]
fn set_capacity_is_floored(input: i64, expected: u32) {
    let mut table = LeaseTable::new(7);
    table.set_capacity(input);
    assert_eq!(table.capacity(), expected);
}

#[test]
fn reset_timestamps_moves_every_lease_to_now() {
    let clock = FakeClock::new();
    let mut table = table_with(2, &["a", "b"], &clock);

    clock.advance(Duration::from_secs(600));
    table.reset_timestamps(clock.now());

    assert!(table.expire(clock.now(), LEASE_TTL).is_empty());
    assert_eq!(table.last_seen("a"), Some(clock.now()));
    assert_eq!(table.last_seen("b"), Some(clock.now()));
}

#[test]
fn status_reports_usage() {
    let clock = FakeClock::new();
    let table = table_with(3, &["a"], &clock);
    assert_eq!(
        table.status(),
        Status {
            capacity: 3,
            in_use: 1,
            available: 2
        }
    );
}

#[test]
fn status_display_matches_operator_lines() {
    let status = Status {
        capacity: 2,
        in_use: 1,
        available: 1,
    };
    assert_eq!(
        status.to_string(),
        "capacity: 2\nslots in use: 1\navailable slots: 1"
    );
}

proptest! {
    #[test]
    fn capacity_never_underflows(start in 0u32..16, decrements in 0usize..40) {
        let mut table = LeaseTable::new(start);
        for _ in 0..decrements {
            table.dec_capacity();
        }
        prop_assert_eq!(table.capacity(), start.saturating_sub(decrements as u32));
    }

    #[test]
    fn guarded_grants_respect_capacity(capacity in 0u32..8, requests in 0usize..20) {
        let clock = FakeClock::new();
        let mut table = LeaseTable::new(capacity);
        for i in 0..requests {
            if table.can_grant() {
                let before = table.in_use();
                prop_assert!(before < table.capacity() as usize);
                table.grant(&format!("worker-{}", i), clock.now());
            }
        }
        prop_assert!(table.in_use() <= capacity as usize);
    }
}
