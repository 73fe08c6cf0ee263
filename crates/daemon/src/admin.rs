// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator endpoint
//!
//! Each request line is a textual command (`inc-capacity`, `set-capacity:3`,
//! `status`, ...). Each reply line is a JSON [`AdminReply`].

use std::io;

use rollover_core::{AdminReply, Command};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::coordinator::Intake;

/// Admin connection errors
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serve one admin connection until the client closes it
pub async fn handle_admin<S>(stream: S, intake: Intake) -> Result<(), AdminError>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = dispatch(&line, &intake).await;
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }

    debug!("admin connection closed");
    Ok(())
}

async fn dispatch(line: &str, intake: &Intake) -> AdminReply {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            warn!(input = line.trim(), error = %e, "dropping malformed admin command");
            return AdminReply::error(e.to_string());
        }
    };

    if command == Command::Shutdown {
        warn!("refusing shutdown over admin endpoint");
        return AdminReply::error("shutdown is only accepted via SIGINT/SIGTERM");
    }

    info!(%command, "admin command");
    match intake.request(command).await {
        Ok(status) => AdminReply::Status(status),
        Err(e) => AdminReply::error(e.to_string()),
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
