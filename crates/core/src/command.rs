// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative commands accepted by the coordinator
//!
//! Operator input and the periodic scheduler share one command intake.
//! Commands are typed here; the textual form only exists at the edges
//! (admin endpoint, CLI) and is parsed with [`str::parse`].

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A command applied to coordinator state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Raise capacity by one
    IncCapacity,
    /// Lower capacity by one, floored at zero
    DecCapacity,
    /// Set capacity to an absolute value, floored at zero
    SetCapacity(i64),
    /// Report capacity and usage to the operator
    Status,
    /// Drop leases whose last heartbeat is older than the TTL
    Expire,
    /// Write a snapshot to durable storage
    Persist,
    /// Persist and stop the coordinator loop
    Shutdown,
}

impl Command {
    /// Canonical name, without payload
    pub fn name(&self) -> &'static str {
        match self {
            Command::IncCapacity => "inc-capacity",
            Command::DecCapacity => "dec-capacity",
            Command::SetCapacity(_) => "set-capacity",
            Command::Status => "status",
            Command::Expire => "expire",
            Command::Persist => "persist",
            Command::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetCapacity(n) => write!(f, "set-capacity:{}", n),
            other => f.write_str(other.name()),
        }
    }
}

/// Errors parsing the textual command form
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command: {0:?}")]
    Unknown(String),
    #[error("invalid set-capacity argument {arg:?}: {reason}")]
    InvalidCapacity { arg: String, reason: String },
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(arg) = s.strip_prefix("set-capacity:") {
            return arg
                .trim()
                .parse::<i64>()
                .map(Command::SetCapacity)
                .map_err(|e| CommandParseError::InvalidCapacity {
                    arg: arg.to_string(),
                    reason: e.to_string(),
                });
        }

        match s {
            "inc-capacity" => Ok(Command::IncCapacity),
            "dec-capacity" => Ok(Command::DecCapacity),
            "status" => Ok(Command::Status),
            "expire" => Ok(Command::Expire),
            "persist" => Ok(Command::Persist),
            "shutdown" => Ok(Command::Shutdown),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
