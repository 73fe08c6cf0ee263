// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker connection handling
//!
//! Line protocol, `\n` delimited:
//! - first line from the client is its lease identity (trimmed, decoded lossily)
//! - later `ping` lines are heartbeats, anything else is ignored, including
//!   lines that are not valid UTF-8
//! - the server writes `ok` once the lease is granted
//!
//! The lease is released whenever the stream ends, whichever side closed it.
//! A line longer than [`MAX_LINE`] ends the stream with an error.

use std::io;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, trace};

use crate::coordinator::{AcquireError, AcquireRequest, CoordinatorGone, Intake};

/// Acknowledgement written to the client once per grant
pub const GRANTED: &[u8] = b"ok\n";

/// Heartbeat line sent by lease holders
pub const PING: &str = "ping";

/// Longest accepted line, newline included
pub const MAX_LINE: usize = 64 * 1024;

/// Connection errors; never affect other connections or the coordinator
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed before an identity was sent")]
    MissingIdentity,

    #[error("coordinator unavailable")]
    CoordinatorUnavailable,

    #[error("acquire refused: {0}")]
    Acquire(#[from] AcquireError),
}

impl From<CoordinatorGone> for ConnectionError {
    fn from(_: CoordinatorGone) -> Self {
        ConnectionError::CoordinatorUnavailable
    }
}

/// Line scanner task; aborted if the handler returns before it finishes
struct Scanner {
    handle: JoinHandle<io::Result<()>>,
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve one worker connection until its stream ends
pub async fn handle_connection<S>(stream: S, intake: Intake) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    debug!("accept");

    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let mut line = Vec::new();
    if !read_line(&mut reader, &mut line).await? {
        return Err(ConnectionError::MissingIdentity);
    }
    let identity = String::from_utf8_lossy(&line).trim().to_string();
    info!(identity = %identity, "received id");

    let mut scanner = Scanner {
        handle: tokio::spawn(scan(reader, identity.clone(), intake.clone())),
    };
    let (request, mut granted) = AcquireRequest::new(identity.clone());

    // Accepted into the intake, or withdrawn because the stream already ended
    tokio::select! {
        sent = intake.submit(request) => {
            sent?;
            debug!(identity = %identity, "submitted");
        }
        ended = &mut scanner.handle => {
            info!(identity = %identity, "canceled");
            return stream_ended(&identity, ended);
        }
    }

    tokio::select! {
        outcome = &mut granted => match outcome {
            Ok(Ok(())) => {
                info!(identity = %identity, "acquired");
                if let Err(e) = acknowledge(&mut writer).await {
                    scanner.handle.abort();
                    let _ = intake.release(identity.as_str()).await;
                    return Err(e.into());
                }
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ConnectionError::CoordinatorUnavailable),
        },
        ended = &mut scanner.handle => {
            // Refuse a grant that has not been sent yet; release one that has
            granted.close();
            if let Ok(Ok(())) = granted.try_recv() {
                let _ = intake.release(identity.as_str()).await;
            }
            return stream_ended(&identity, ended);
        }
    }

    let ended = (&mut scanner.handle).await;
    stream_ended(&identity, ended)
}

async fn acknowledge<W: AsyncWrite + Unpin>(writer: &mut W) -> io::Result<()> {
    writer.write_all(GRANTED).await?;
    writer.flush().await
}

/// Read one `\n` terminated line of raw bytes into `buf`
///
/// Returns false at end of stream. A final line without a newline still
/// counts as a line.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut limited = (&mut *reader).take(MAX_LINE as u64);
    let read = limited.read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(false);
    }
    if read == MAX_LINE && buf.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE),
        ));
    }
    Ok(true)
}

/// Turn `ping` lines into heartbeats; release the lease when the stream ends
async fn scan<R>(mut reader: R, identity: String, intake: Intake) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let result = loop {
        line.clear();
        match read_line(&mut reader, &mut line).await {
            Ok(true) => {
                if line.trim_ascii() == PING.as_bytes() {
                    trace!(identity = %identity, "ping");
                    if intake.heartbeat(identity.as_str()).await.is_err() {
                        break Ok(());
                    }
                }
            }
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let _ = intake.release(identity).await;
    result
}

fn stream_ended(
    identity: &str,
    ended: Result<io::Result<()>, JoinError>,
) -> Result<(), ConnectionError> {
    match ended {
        Ok(Ok(())) => {
            info!(identity, "eof");
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(io::Error::other(e).into()),
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
