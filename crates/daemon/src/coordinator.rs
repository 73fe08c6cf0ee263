// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator: the single owner of capacity and lease state
//!
//! Every mutation is serialized through one loop. Connection handlers, the
//! periodic scheduler and the admin endpoint only talk to it through an
//! [`Intake`], so the lease table needs no locking.
//!
//! Each iteration:
//! 1. If a slot is free, try (without waiting) to dequeue one acquire request.
//! 2. Wait for exactly one of: control command, heartbeat, release, poll tick.

use std::time::Duration;

use rollover_core::{Clock, Command, Grant, LeaseTable, Status, LEASE_TTL};
use rollover_storage::{Snapshot, SnapshotStore};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

/// Coordinator tuning
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Leases not heard from for longer than this are dropped by `expire`
    pub ttl: Duration,
    /// Wake-up interval so queued acquire requests are retried without traffic
    pub poll_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ttl: LEASE_TTL,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Why a pending acquire request was refused
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AcquireError {
    #[error("coordinator is shutting down")]
    ShuttingDown,
}

/// The coordinator loop has stopped and no longer accepts messages
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("coordinator is not running")]
pub struct CoordinatorGone;

/// Pending demand for a capacity slot
#[derive(Debug)]
pub struct AcquireRequest {
    identity: String,
    reply: oneshot::Sender<Result<(), AcquireError>>,
}

impl AcquireRequest {
    /// Create a request and the receiver its grant (or refusal) arrives on
    ///
    /// Dropping the receiver before the coordinator dequeues the request
    /// cancels it.
    pub fn new(
        identity: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Result<(), AcquireError>>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                identity: identity.into(),
                reply,
            },
            rx,
        )
    }
}

/// A command plus an optional reply slot for the resulting status
#[derive(Debug)]
pub struct Control {
    pub command: Command,
    reply: Option<oneshot::Sender<Status>>,
}

impl Control {
    /// Fire-and-forget command
    pub fn new(command: Command) -> Self {
        Self {
            command,
            reply: None,
        }
    }

    /// Command whose post-apply status is sent back
    pub fn with_reply(command: Command) -> (Self, oneshot::Receiver<Status>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                command,
                reply: Some(tx),
            },
            rx,
        )
    }
}

/// Producer side of the coordinator's event stream
#[derive(Clone, Debug)]
pub struct Intake {
    acquire: mpsc::Sender<AcquireRequest>,
    heartbeats: mpsc::Sender<String>,
    releases: mpsc::Sender<String>,
    control: mpsc::Sender<Control>,
}

/// Consumer side, owned by the coordinator
#[derive(Debug)]
pub(crate) struct IntakeReceivers {
    pub(crate) acquire: mpsc::Receiver<AcquireRequest>,
    pub(crate) heartbeats: mpsc::Receiver<String>,
    pub(crate) releases: mpsc::Receiver<String>,
    pub(crate) control: mpsc::Receiver<Control>,
}

impl Intake {
    /// Single-slot channels: producers wait until the coordinator drains them
    pub(crate) fn channel() -> (Intake, IntakeReceivers) {
        let (acquire, acquire_rx) = mpsc::channel(1);
        let (heartbeats, heartbeats_rx) = mpsc::channel(1);
        let (releases, releases_rx) = mpsc::channel(1);
        let (control, control_rx) = mpsc::channel(1);
        (
            Intake {
                acquire,
                heartbeats,
                releases,
                control,
            },
            IntakeReceivers {
                acquire: acquire_rx,
                heartbeats: heartbeats_rx,
                releases: releases_rx,
                control: control_rx,
            },
        )
    }

    /// Queue an acquire request; resolves once the intake accepted it
    pub async fn submit(&self, request: AcquireRequest) -> Result<(), CoordinatorGone> {
        self.acquire.send(request).await.map_err(|_| CoordinatorGone)
    }

    pub async fn heartbeat(&self, identity: impl Into<String>) -> Result<(), CoordinatorGone> {
        self.heartbeats
            .send(identity.into())
            .await
            .map_err(|_| CoordinatorGone)
    }

    pub async fn release(&self, identity: impl Into<String>) -> Result<(), CoordinatorGone> {
        self.releases
            .send(identity.into())
            .await
            .map_err(|_| CoordinatorGone)
    }

    /// Send a command without waiting for it to be applied
    pub async fn command(&self, command: Command) -> Result<(), CoordinatorGone> {
        self.control
            .send(Control::new(command))
            .await
            .map_err(|_| CoordinatorGone)
    }

    /// Send a command and wait for the status after it was applied
    pub async fn request(&self, command: Command) -> Result<Status, CoordinatorGone> {
        let (control, reply) = Control::with_reply(command);
        self.control
            .send(control)
            .await
            .map_err(|_| CoordinatorGone)?;
        reply.await.map_err(|_| CoordinatorGone)
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Lease state machine driven by the intake
pub struct Coordinator<S: SnapshotStore, C: Clock> {
    table: LeaseTable,
    store: S,
    clock: C,
    config: CoordinatorConfig,
    rx: IntakeReceivers,
}

impl<S: SnapshotStore, C: Clock> Coordinator<S, C> {
    /// Build a coordinator from the last persisted snapshot
    ///
    /// A missing snapshot starts empty. An unreadable one is logged and also
    /// starts empty.
    pub fn new(store: S, clock: C, config: CoordinatorConfig) -> (Self, Intake) {
        let table = load_table(&store, &clock);
        let (intake, rx) = Intake::channel();
        (
            Self {
                table,
                store,
                clock,
                config,
                rx,
            },
            intake,
        )
    }

    pub fn table(&self) -> &LeaseTable {
        &self.table
    }

    /// Run until `shutdown` is applied or every intake handle is dropped
    ///
    /// Returns the final lease table.
    pub async fn run(mut self) -> LeaseTable {
        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            capacity = self.table.capacity(),
            leases = self.table.in_use(),
            "coordinator started"
        );

        loop {
            trace!("entering loop");

            if self.table.can_grant() {
                match self.rx.acquire.try_recv() {
                    Ok(request) => self.grant(request),
                    Err(TryRecvError::Empty) => trace!("queue empty"),
                    Err(TryRecvError::Disconnected) => {}
                }
            }

            tokio::select! {
                control = self.rx.control.recv() => {
                    let Some(control) = control else {
                        warn!("intake closed, stopping coordinator");
                        break;
                    };
                    if let Flow::Stop = self.apply(control) {
                        break;
                    }
                }

                Some(identity) = self.rx.heartbeats.recv() => self.heartbeat(&identity),

                Some(identity) = self.rx.releases.recv() => self.release(&identity),

                _ = poll.tick() => trace!("poll"),
            }
        }

        info!("coordinator stopped");
        self.table
    }

    fn grant(&mut self, request: AcquireRequest) {
        let AcquireRequest { identity, reply } = request;

        if reply.is_closed() {
            info!(identity = %identity, "canceled before grant");
            return;
        }

        let grant = self.table.grant(&identity, self.clock.now());
        if reply.send(Ok(())).is_err() {
            // Requester went away between the check and the send
            if grant == Grant::Created {
                self.table.release(&identity);
            }
            info!(identity = %identity, "canceled during grant");
            return;
        }

        info!(
            identity = %identity,
            coalesced = grant == Grant::Coalesced,
            in_use = self.table.in_use(),
            capacity = self.table.capacity(),
            "acquire"
        );
    }

    fn heartbeat(&mut self, identity: &str) {
        if self.table.heartbeat(identity, self.clock.now()) {
            trace!(identity, "heartbeat");
        } else {
            debug!(identity, "heartbeat for unknown lease ignored");
        }
    }

    fn release(&mut self, identity: &str) {
        if self.table.release(identity) {
            info!(
                identity,
                in_use = self.table.in_use(),
                capacity = self.table.capacity(),
                "release"
            );
        } else {
            debug!(identity, "release for unknown lease ignored");
        }
    }

    fn apply(&mut self, control: Control) -> Flow {
        let Control { command, reply } = control;
        debug!(%command, "command");

        let flow = match command {
            Command::IncCapacity => {
                self.table.inc_capacity();
                info!(capacity = self.table.capacity(), "inc-capacity");
                Flow::Continue
            }
            Command::DecCapacity => {
                self.table.dec_capacity();
                info!(capacity = self.table.capacity(), "dec-capacity");
                Flow::Continue
            }
            Command::SetCapacity(n) => {
                self.table.set_capacity(n);
                info!(requested = n, capacity = self.table.capacity(), "set-capacity");
                Flow::Continue
            }
            Command::Status => {
                let status = self.table.status();
                println!("{}", status);
                info!(
                    capacity = status.capacity,
                    in_use = status.in_use,
                    available = status.available,
                    "status"
                );
                Flow::Continue
            }
            Command::Expire => {
                for identity in self.table.expire(self.clock.now(), self.config.ttl) {
                    info!(identity = %identity, "expired lease");
                }
                Flow::Continue
            }
            Command::Persist => {
                self.persist();
                Flow::Continue
            }
            Command::Shutdown => {
                info!("shutdown");
                self.persist();
                self.refuse_pending();
                Flow::Stop
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(self.table.status());
        }
        flow
    }

    fn persist(&self) {
        let snapshot = Snapshot::capture(&self.table);
        match self.store.save(&snapshot) {
            Ok(()) => debug!(
                capacity = snapshot.capacity,
                leases = snapshot.locks.len(),
                "persisted state"
            ),
            Err(e) => error!(error = %e, "error persisting state"),
        }
    }

    /// Close the acquire queue and answer everything still in it
    fn refuse_pending(&mut self) {
        self.rx.acquire.close();
        while let Ok(request) = self.rx.acquire.try_recv() {
            debug!(identity = %request.identity, "refusing pending acquire");
            let _ = request.reply.send(Err(AcquireError::ShuttingDown));
        }
    }
}

fn load_table<S: SnapshotStore, C: Clock>(store: &S, clock: &C) -> LeaseTable {
    match store.load() {
        Ok(Some(snapshot)) => {
            let table = snapshot.restore(clock.now());
            info!(
                capacity = table.capacity(),
                leases = table.in_use(),
                "restored state, lease timestamps reset"
            );
            table
        }
        Ok(None) => {
            debug!("no saved state, starting empty");
            LeaseTable::default()
        }
        Err(e) => {
            error!(error = %e, "error reading state, starting empty");
            LeaseTable::default()
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
