// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::*;
use tokio::net::TcpListener;

/// Accept one connection, record the first line, answer with `reply`
async fn one_shot_server(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let received = lines.next_line().await.unwrap().unwrap_or_default();
        write.write_all(reply.as_bytes()).await.unwrap();
        received
    });
    (addr, handle)
}

#[test]
fn status_reply_parses() {
    let status = parse_reply(r#"{"capacity":3,"in_use":1,"available":2}"#).unwrap();
    assert_eq!(status.capacity, 3);
    assert_eq!(status.in_use, 1);
    assert_eq!(status.available, 2);
}

#[test]
fn error_reply_is_rejection() {
    let err = parse_reply(r#"{"error":"unknown command: nope"}"#).unwrap_err();
    assert!(matches!(err, ClientError::Rejected(msg) if msg == "unknown command: nope"));
}

#[test]
fn garbage_reply_is_json_error() {
    assert!(matches!(parse_reply("not json"), Err(ClientError::Json(_))));
}

#[tokio::test]
async fn admin_sends_textual_command() {
    let (addr, server) =
        one_shot_server("{\"capacity\":5,\"in_use\":0,\"available\":5}\n").await;

    let status = AdminClient::new(addr)
        .send(Command::SetCapacity(5))
        .await
        .unwrap();

    assert_eq!(status.capacity, 5);
    assert_eq!(server.await.unwrap(), "set-capacity:5");
}

#[tokio::test]
async fn admin_reports_closed_connection() {
    let (addr, _server) = one_shot_server("").await;

    let result = AdminClient::new(addr).send(Command::Status).await;
    assert!(matches!(result, Err(ClientError::Closed)));
}

#[tokio::test]
async fn admin_reports_unreachable_daemon() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = AdminClient::new(addr).send(Command::Status).await;
    assert!(matches!(result, Err(ClientError::Unreachable(..))));
}

#[tokio::test]
async fn worker_announces_identity_and_waits_for_ok() {
    let (addr, server) = one_shot_server("ok\n").await;

    let mut worker = WorkerClient::connect(&addr, "worker-1").await.unwrap();
    worker.acquired().await.unwrap();

    assert_eq!(worker.identity(), "worker-1");
    assert_eq!(server.await.unwrap(), "worker-1");
}

#[tokio::test]
async fn worker_rejects_unexpected_acknowledgement() {
    let (addr, _server) = one_shot_server("nope\n").await;

    let mut worker = WorkerClient::connect(&addr, "worker-1").await.unwrap();
    assert!(matches!(
        worker.acquired().await,
        Err(ClientError::UnexpectedResponse(line)) if line == "nope"
    ));
}
