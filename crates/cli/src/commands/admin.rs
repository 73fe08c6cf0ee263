// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rollover admin` - Operator commands against a running daemon

use anyhow::Result;
use clap::{Args, Subcommand};
use rollover_core::Command;

use crate::client::AdminClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct AdminArgs {
    /// Daemon admin endpoint
    #[arg(long, env = "ROLLOVER_ADMIN_ADDR", default_value = "127.0.0.1:8081")]
    pub admin_addr: String,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Show capacity and slot usage
    Status,
    /// Raise capacity by one
    IncCapacity,
    /// Lower capacity by one (never below zero)
    DecCapacity,
    /// Set capacity; negative values floor at zero
    SetCapacity {
        #[arg(allow_negative_numbers = true)]
        capacity: i64,
    },
    /// Drop leases not heard from within the TTL
    Expire,
    /// Write the state file now
    Persist,
}

impl From<AdminCommand> for Command {
    fn from(command: AdminCommand) -> Self {
        match command {
            AdminCommand::Status => Command::Status,
            AdminCommand::IncCapacity => Command::IncCapacity,
            AdminCommand::DecCapacity => Command::DecCapacity,
            AdminCommand::SetCapacity { capacity } => Command::SetCapacity(capacity),
            AdminCommand::Expire => Command::Expire,
            AdminCommand::Persist => Command::Persist,
        }
    }
}

pub async fn handle(args: AdminArgs) -> Result<()> {
    let client = AdminClient::new(args.admin_addr);
    let status = client.send(args.command.into()).await?;
    output::print(&status, args.output)?;
    Ok(())
}
