// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rollover hold` - Hold a capacity slot
//!
//! Without a command, holds the slot until Ctrl-C. With a trailing command,
//! holds it for as long as the command runs and exits with its status.

use std::process::ExitStatus;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::client::WorkerClient;

#[derive(clap::Args)]
pub struct HoldArgs {
    /// Lease identity (random if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Daemon worker endpoint
    #[arg(long, env = "ROLLOVER_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Seconds between heartbeats; keep well under the 60s lease TTL
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Command to run while the slot is held
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Returns the exit code to terminate with
pub async fn handle(args: HoldArgs) -> Result<i32> {
    let identity = args
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut worker = WorkerClient::connect(&args.addr, identity)
        .await
        .with_context(|| format!("connecting to {}", args.addr))?;

    eprintln!("waiting for a slot as {}...", worker.identity());
    tokio::select! {
        acquired = worker.acquired() => acquired?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\ncanceled");
            return Ok(130);
        }
    }
    println!("acquired {}", worker.identity());
    info!(identity = worker.identity(), "acquired");

    let period = Duration::from_secs(args.interval);
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut child = match args.command.split_first() {
        Some((program, rest)) => Some(
            tokio::process::Command::new(program)
                .args(rest)
                .spawn()
                .with_context(|| format!("starting {}", program))?,
        ),
        None => None,
    };

    let code = loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                debug!(identity = worker.identity(), "ping");
                worker.ping().await?;
            }
            status = wait_child(&mut child) => break exit_code(status?),
            closed = worker.closed() => {
                closed?;
                if let Some(child) = child.as_mut() {
                    let _ = child.kill().await;
                }
                bail!("daemon closed the connection; slot lost");
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nreleasing");
                if let Some(child) = child.as_mut() {
                    let _ = child.kill().await;
                }
                break 130;
            }
        }
    };

    // Closing the connection releases the lease
    drop(worker);
    println!("released");
    Ok(code)
}

async fn wait_child(child: &mut Option<tokio::process::Child>) -> std::io::Result<ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
