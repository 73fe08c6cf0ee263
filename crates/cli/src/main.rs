// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rollover - command line client for the rollover daemon

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{admin, hold};

#[derive(Parser)]
#[command(
    name = "rollover",
    version,
    about = "Rollover - capacity admission for worker pools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Operator commands (status, capacity changes, expire, persist)
    Admin(admin::AdminArgs),
    /// Hold a capacity slot, optionally while running a command
    Hold(hold::HoldArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Admin(args) => admin::handle(args).await,
        Commands::Hold(args) => {
            let code = hold::handle(args).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
