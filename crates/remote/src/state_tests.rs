// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::Utc;
use serde_json::json;
use sfs_core::Mutation;

fn op(seq: u32, mutation: Mutation) -> QueuedOperation {
    QueuedOperation::from_mutation(OpId::new(1_000, seq, 0), mutation, Utc::now())
}

fn is_ack(reply: &ServerMessage) -> bool {
    matches!(reply, ServerMessage::Ack { .. })
}

fn is_fatal_rejection(reply: &ServerMessage) -> bool {
    matches!(reply, ServerMessage::Rejected { retryable: false, .. })
}

#[tokio::test]
async fn create_then_fetch_returns_payload() {
    let state = ServerState::new();
    let reply = state.apply(&op(0, Mutation::create("product:1", json!({"price": 5})))).await;
    assert_eq!(reply, ServerMessage::ack(OpId::new(1_000, 0, 0)));

    let fetched = state.fetch("product:1").await;
    assert_eq!(fetched, ServerMessage::value("product:1", json!({"price": 5})));
}

#[tokio::test]
async fn fetch_of_unknown_key_is_not_found() {
    let state = ServerState::new();
    assert_eq!(state.fetch("nope").await, ServerMessage::not_found("nope"));
}

#[tokio::test]
async fn create_on_existing_key_is_rejected() {
    let state = ServerState::new();
    state.apply(&op(0, Mutation::create("k", json!(1)))).await;
    let reply = state.apply(&op(1, Mutation::create("k", json!(2)))).await;

    assert!(is_fatal_rejection(&reply));
    assert_eq!(state.get("k").await, Some(json!(1)));
}

#[tokio::test]
async fn update_of_missing_key_is_rejected() {
    let state = ServerState::new();
    let reply = state.apply(&op(0, Mutation::update("k", json!(1)))).await;
    assert!(is_fatal_rejection(&reply));
    assert_eq!(state.applied_count().await, 0);
}

#[tokio::test]
async fn create_with_null_payload_is_rejected() {
    let state = ServerState::new();
    let reply = state.apply(&op(0, Mutation::create("k", serde_json::Value::Null))).await;
    assert!(is_fatal_rejection(&reply));
    assert_eq!(state.get("k").await, None);
}

#[tokio::test]
async fn update_with_null_payload_is_rejected() {
    let state = ServerState::new();
    state.apply(&op(0, Mutation::create("k", json!(0)))).await;
    let reply = state.apply(&op(1, Mutation::update("k", serde_json::Value::Null))).await;
    assert!(is_fatal_rejection(&reply));
    assert_eq!(state.get("k").await, Some(json!(0)));
}

#[tokio::test]
async fn delete_of_missing_key_is_acknowledged() {
    let state = ServerState::new();
    let reply = state.apply(&op(0, Mutation::delete("ghost"))).await;
    assert!(is_ack(&reply));
}

#[tokio::test]
async fn delete_removes_entity() {
    let state = ServerState::new();
    state.apply(&op(0, Mutation::create("k", json!(1)))).await;
    state.apply(&op(1, Mutation::delete("k"))).await;
    assert_eq!(state.get("k").await, None);
}

#[tokio::test]
async fn replayed_operation_is_not_applied_twice() {
    let state = ServerState::new();
    state.apply(&op(0, Mutation::create("k", json!(1)))).await;
    let update = op(1, Mutation::update("k", json!(2)));
    state.apply(&update).await;
    state.apply(&op(2, Mutation::update("k", json!(3)))).await;

    let reply = state.apply(&update).await;

    assert_eq!(reply, ServerMessage::ack(update.id));
    assert_eq!(state.get("k").await, Some(json!(3)));
    assert_eq!(state.applied_count().await, 3);
}

#[tokio::test]
async fn replayed_create_is_acknowledged_not_rejected() {
    let state = ServerState::new();
    let create = op(0, Mutation::create("k", json!(1)));
    state.apply(&create).await;
    assert!(is_ack(&state.apply(&create).await));
}

#[tokio::test]
async fn same_instant_from_two_clients_is_applied_twice() {
    let state = ServerState::new();
    state.apply(&op(0, Mutation::create("k", json!(0)))).await;

    let mut first = op(1, Mutation::update("k", json!(1)));
    let mut second = op(1, Mutation::update("k", json!(2)));
    first.id.node = 7;
    second.id.node = 8;

    assert!(is_ack(&state.apply(&first).await));
    assert!(is_ack(&state.apply(&second).await));
    assert_eq!(state.get("k").await, Some(json!(2)));
    assert_eq!(state.applied_count().await, 3);
}
