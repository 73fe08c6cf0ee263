// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollover Daemon (rolloverd)
//!
//! Leases capacity slots to worker connections and persists them across
//! restarts.

use std::path::PathBuf;

use clap::Parser;
use rollover_daemon::{lifecycle, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rolloverd", version, about = "Rollover admission daemon")]
struct Args {
    /// Capacity to apply at startup; 0 keeps the restored value
    #[arg(long, env = "ROLLOVER_CAPACITY", default_value_t = 0)]
    capacity: i64,

    /// Worker listen address
    #[arg(long, env = "ROLLOVER_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Operator endpoint listen address (disabled when unset)
    #[arg(long, env = "ROLLOVER_ADMIN_ADDR")]
    admin_addr: Option<String>,

    /// Snapshot file
    #[arg(long, env = "ROLLOVER_STATE", default_value = "state.json")]
    state_file: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "ROLLOVER_LOG")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            addr: self.addr.clone(),
            admin_addr: self.admin_addr.clone(),
            capacity: self.capacity,
            state_path: self.state_file.clone(),
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.config();

    // Set up logging; guard flushes the file writer on drop
    let _log_guard = setup_logging(args.log_file.as_deref())?;

    info!(
        state = %config.state_path.display(),
        "starting rolloverd (pid: {})",
        std::process::id()
    );

    // Set up signal handlers before binding so an early signal is not lost
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let addr = daemon.local_addr()?;
    info!("Daemon ready, listening on {}", addr);

    // Signal ready for parent process; carries the bound address for port 0
    println!("READY {}", addr);

    daemon
        .serve(async {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await;

    daemon.shutdown().await?;
    info!("exiting cleanly");
    Ok(())
}

fn setup_logging(
    log_file: Option<&std::path::Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => std::path::Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", path.display()),
        )
    })?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
