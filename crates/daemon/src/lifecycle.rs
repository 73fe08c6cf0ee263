// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, serving, shutdown.

use std::fs::File;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use rollover_core::{Command, LeaseTable, SystemClock};
use rollover_storage::FileSnapshotStore;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::admin::handle_admin;
use crate::connection::handle_connection;
use crate::coordinator::{Coordinator, CoordinatorConfig, Intake};
use crate::scheduler::{spawn_periodic, SchedulerConfig};

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker listen address
    pub addr: String,
    /// Operator endpoint; disabled when unset
    pub admin_addr: Option<String>,
    /// Initial capacity override, applied only when > 0
    pub capacity: i64,
    /// Snapshot file
    pub state_path: PathBuf,
    pub coordinator: CoordinatorConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            admin_addr: None,
            capacity: 0,
            state_path: PathBuf::from("state.json"),
            coordinator: CoordinatorConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Lock file guarding the state file against a second daemon
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .state_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".lock");
        self.state_path.with_file_name(name)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, io::Error),

    #[error("Coordinator is not running")]
    CoordinatorUnavailable,

    #[error("Coordinator task failed: {0}")]
    CoordinatorFailed(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Daemon state during operation
pub struct Daemon {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    lock_file: File,
    listener: TcpListener,
    admin: Option<TcpListener>,
    intake: Intake,
    coordinator: JoinHandle<LeaseTable>,
    periodic: Vec<JoinHandle<()>>,
}

/// Start the daemon
///
/// Loads the last snapshot, starts the coordinator and periodic commands,
/// then binds the listeners. Any bind failure is fatal.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    // 1. Acquire lock file FIRST - prevents two daemons sharing a state file
    let lock_path = config.lock_path();
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let lock_file = File::create(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // 2. Restore state and start the coordinator
    let store = FileSnapshotStore::new(&config.state_path);
    let (coordinator, intake) =
        Coordinator::new(store, SystemClock, config.coordinator.clone());
    let coordinator = tokio::spawn(coordinator.run());

    if config.capacity > 0 {
        info!(capacity = config.capacity, "setting capacity");
        intake
            .command(Command::SetCapacity(config.capacity))
            .await
            .map_err(|_| LifecycleError::CoordinatorUnavailable)?;
    }

    // 3. Periodic status / persist / expire
    let periodic = spawn_periodic(&intake, &config.scheduler);

    // 4. Bind (LAST - only after state is loaded)
    let listeners = async {
        let listener = bind(&config.addr).await?;
        let admin = match &config.admin_addr {
            Some(addr) => Some(bind(addr).await?),
            None => None,
        };
        Ok::<_, LifecycleError>((listener, admin))
    }
    .await;

    let (listener, admin) = match listeners {
        Ok(bound) => bound,
        Err(e) => {
            for task in &periodic {
                task.abort();
            }
            coordinator.abort();
            let _ = std::fs::remove_file(&lock_path);
            return Err(e);
        }
    };

    info!(addr = %config.addr, "listening");
    if let Some(addr) = &config.admin_addr {
        info!(addr = %addr, "admin endpoint listening");
    }

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        listener,
        admin,
        intake,
        coordinator,
        periodic,
    })
}

async fn bind(addr: &str) -> Result<TcpListener, LifecycleError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr.to_string(), e))
}

impl Daemon {
    /// Address the worker listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Address the admin listener is bound to, if enabled
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Handle for feeding the coordinator directly
    pub fn intake(&self) -> Intake {
        self.intake.clone()
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// A failed accept is logged and retried after a short pause; it never
    /// takes down the service.
    pub async fn serve<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let intake = self.intake.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, intake).await {
                                warn!(%peer, error = %e, "error handling connection");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "could not accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },

                accepted = accept_admin(self.admin.as_ref()) => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted admin connection");
                        let intake = self.intake.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_admin(stream, intake).await {
                                warn!(%peer, error = %e, "error handling admin connection");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "could not accept admin connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }

    /// Shutdown the daemon gracefully
    ///
    /// Persists through the coordinator, waits for its loop to end, then
    /// closes the listeners and releases the lock file. Returns the final
    /// lease table.
    pub async fn shutdown(self) -> Result<LeaseTable, LifecycleError> {
        info!("shutting down server (write state file)");

        // 1. Persist and stop the coordinator
        self.intake
            .request(Command::Shutdown)
            .await
            .map_err(|_| LifecycleError::CoordinatorUnavailable)?;
        for task in &self.periodic {
            task.abort();
        }
        let table = self.coordinator.await?;

        // 2. Stop accepting connections
        info!("shutting down tcp server");
        drop(self.listener);
        drop(self.admin);

        // 3. Release and remove the lock file
        let lock_path = self.config.lock_path();
        if let Err(e) = fs2::FileExt::unlock(&self.lock_file) {
            warn!(error = %e, "failed to unlock state lock file");
        }
        if let Err(e) = std::fs::remove_file(&lock_path) {
            warn!(error = %e, "failed to remove state lock file");
        }

        info!(
            capacity = table.capacity(),
            leases = table.in_use(),
            "daemon shutdown complete"
        );
        Ok(table)
    }
}

async fn accept_admin(
    admin: Option<&TcpListener>,
) -> io::Result<(tokio::net::TcpStream, SocketAddr)> {
    match admin {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
