// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon clients for CLI commands
//!
//! [`AdminClient`] talks to the operator endpoint, [`WorkerClient`] holds a
//! lease on the worker endpoint.

use std::time::Duration;

use rollover_core::{AdminReply, Command, Status};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for admin requests
pub fn timeout_admin() -> Duration {
    parse_duration_ms("ROLLOVER_TIMEOUT_ADMIN_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for connecting to the daemon
pub fn timeout_connect() -> Duration {
    parse_duration_ms("ROLLOVER_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not reachable at {0}")]
    Unreachable(String, #[source] std::io::Error),

    #[error("Timed out waiting for the daemon")]
    Timeout,

    #[error("Daemon closed the connection")]
    Closed,

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

async fn connect(addr: &str) -> Result<TcpStream, ClientError> {
    match tokio::time::timeout(timeout_connect(), TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ClientError::Unreachable(addr.to_string(), e)),
        Err(_) => Err(ClientError::Timeout),
    }
}

/// Operator endpoint client
pub struct AdminClient {
    addr: String,
}

impl AdminClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Send one command and return the status the daemon reports after it
    pub async fn send(&self, command: Command) -> Result<Status, ClientError> {
        let stream = connect(&self.addr).await?;
        let (read, mut write) = stream.into_split();

        write
            .write_all(format!("{}\n", command).as_bytes())
            .await?;
        write.flush().await?;

        let mut lines = BufReader::new(read).lines();
        let line = tokio::time::timeout(timeout_admin(), lines.next_line())
            .await
            .map_err(|_| ClientError::Timeout)??
            .ok_or(ClientError::Closed)?;

        parse_reply(&line)
    }
}

fn parse_reply(line: &str) -> Result<Status, ClientError> {
    match serde_json::from_str::<AdminReply>(line)? {
        AdminReply::Status(status) => Ok(status),
        AdminReply::Error { error } => Err(ClientError::Rejected(error)),
    }
}

/// Lease holder on the worker endpoint
///
/// Dropping the client closes the connection, which releases the lease.
pub struct WorkerClient {
    identity: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl WorkerClient {
    /// Connect and announce `identity`; the lease is not held until
    /// [`WorkerClient::acquired`] returns.
    pub async fn connect(addr: &str, identity: impl Into<String>) -> Result<Self, ClientError> {
        let identity = identity.into();
        let stream = connect(addr).await?;
        let (read, mut write) = stream.into_split();

        write.write_all(format!("{}\n", identity).as_bytes()).await?;
        write.flush().await?;

        Ok(Self {
            identity,
            lines: BufReader::new(read).lines(),
            write,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Wait, without a timeout, until the daemon grants the lease
    pub async fn acquired(&mut self) -> Result<(), ClientError> {
        match self.lines.next_line().await? {
            Some(line) if line.trim() == "ok" => Ok(()),
            Some(line) => Err(ClientError::UnexpectedResponse(line)),
            None => Err(ClientError::Closed),
        }
    }

    /// Refresh the lease
    pub async fn ping(&mut self) -> Result<(), ClientError> {
        self.write.write_all(b"ping\n").await?;
        self.write.flush().await?;
        Ok(())
    }

    /// Resolves once the daemon closes the connection
    pub async fn closed(&mut self) -> Result<(), ClientError> {
        while self.lines.next_line().await?.is_some() {}
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
