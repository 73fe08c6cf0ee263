// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

use rollover_daemon::{lifecycle, Config, CoordinatorConfig};
use tempfile::TempDir;
use tokio::sync::oneshot;

/// A daemon running on its own runtime thread with ephemeral ports.
/// Shut down gracefully when dropped.
pub struct TestDaemon {
    pub addr: SocketAddr,
    pub admin: SocketAddr,
    pub state_dir: TempDir,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestDaemon {
    pub fn start(capacity: i64) -> Self {
        let state_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            addr: "127.0.0.1:0".to_string(),
            admin_addr: Some("127.0.0.1:0".to_string()),
            capacity,
            state_path: state_dir.path().join("state.json"),
            coordinator: CoordinatorConfig {
                poll_interval: Duration::from_millis(10),
                ..CoordinatorConfig::default()
            },
            ..Config::default()
        };

        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let (stop, stopped) = oneshot::channel::<()>();
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
            runtime.block_on(async move {
                let daemon = lifecycle::startup(&config)
                    .await
                    .expect("Failed to start daemon");
                let addrs = (
                    daemon.local_addr().expect("no worker address"),
                    daemon.admin_addr().expect("no admin address"),
                );
                ready_tx.send(addrs).expect("test dropped");
                daemon
                    .serve(async {
                        let _ = stopped.await;
                    })
                    .await;
                daemon.shutdown().await.expect("Failed to shut down daemon");
            });
        });

        let (addr, admin) = ready_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("daemon did not start");

        Self {
            addr,
            admin,
            state_dir,
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn admin_addr(&self) -> String {
        self.admin.to_string()
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
