// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use chrono::Utc;
use serde_json::json;
use sfs_core::{Mutation, OpId, QueuedOperation};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Server on a random port; the accept loop dies with the test runtime.
async fn start() -> (String, ServerState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ServerState::new();
    let served = state.clone();
    tokio::spawn(async move {
        let _ = run(listener, served).await;
    });
    (format!("ws://{addr}"), state)
}

async fn roundtrip(ws: &mut Client, msg: &ClientMessage) -> ServerMessage {
    ws.send(Message::Text(msg.to_json().unwrap().into())).await.unwrap();
    match timeout(Duration::from_secs(5), ws.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => ServerMessage::from_json(&text).unwrap(),
        other => panic!("expected a text reply, got {other:?}"),
    }
}

fn op(seq: u32, mutation: Mutation) -> QueuedOperation {
    QueuedOperation::from_mutation(OpId::new(2_000, seq, 0), mutation, Utc::now())
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let (url, _state) = start().await;
    let (mut ws, _) = connect_async(&url).await.unwrap();

    let reply = roundtrip(&mut ws, &ClientMessage::ping(42)).await;
    assert_eq!(reply, ServerMessage::pong(42));
}

#[tokio::test]
async fn submit_then_fetch_over_one_connection() {
    let (url, state) = start().await;
    let (mut ws, _) = connect_async(&url).await.unwrap();

    let create = op(0, Mutation::create("product:1", json!({"price": 10})));
    let reply = roundtrip(&mut ws, &ClientMessage::submit(create.clone())).await;
    assert_eq!(reply, ServerMessage::ack(create.id));

    let reply = roundtrip(&mut ws, &ClientMessage::fetch("product:1")).await;
    assert_eq!(reply, ServerMessage::value("product:1", json!({"price": 10})));
    assert_eq!(state.applied_count().await, 1);
}

#[tokio::test]
async fn rejection_is_reported_as_not_retryable() {
    let (url, _state) = start().await;
    let (mut ws, _) = connect_async(&url).await.unwrap();

    let update = op(0, Mutation::update("missing", json!(1)));
    let reply = roundtrip(&mut ws, &ClientMessage::submit(update.clone())).await;
    match reply {
        ServerMessage::Rejected { id, retryable, .. } => {
            assert_eq!(id, update.id);
            assert!(!retryable);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_request_gets_error_reply() {
    let (url, _state) = start().await;
    let (mut ws, _) = connect_async(&url).await.unwrap();

    ws.send(Message::Text("{not json".into())).await.unwrap();
    let reply = timeout(Duration::from_secs(5), ws.next()).await.unwrap().unwrap().unwrap();
    let reply = ServerMessage::from_json(reply.to_text().unwrap()).unwrap();
    assert!(matches!(reply, ServerMessage::Error { .. }));

    // The connection stays usable.
    assert_eq!(roundtrip(&mut ws, &ClientMessage::ping(1)).await, ServerMessage::pong(1));
}

#[tokio::test]
async fn state_is_shared_across_connections() {
    let (url, _state) = start().await;
    let (mut first, _) = connect_async(&url).await.unwrap();
    let (mut second, _) = connect_async(&url).await.unwrap();

    roundtrip(&mut first, &ClientMessage::submit(op(0, Mutation::create("k", json!("v"))))).await;
    let reply = roundtrip(&mut second, &ClientMessage::fetch("k")).await;
    assert_eq!(reply, ServerMessage::value("k", json!("v")));
}

#[tokio::test]
async fn handle_client_message_routes_fetch_of_unknown_key() {
    let state = ServerState::new();
    let text = ClientMessage::fetch("ghost").to_json().unwrap();
    assert_eq!(handle_client_message(&text, &state).await, ServerMessage::not_found("ghost"));
}
