// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::op::Mutation;
use chrono::Utc;
use serde_json::json;

fn test_op() -> QueuedOperation {
    QueuedOperation::from_mutation(
        OpId::new(1000, 2, 0),
        Mutation::create("product:1", json!({"name": "Lamp"})),
        Utc::now(),
    )
}

#[test]
fn submit_wire_format() {
    let json: serde_json::Value =
        serde_json::from_str(&ClientMessage::submit(test_op()).to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "submit");
    assert_eq!(json["op"]["entity_key"], "product:1");
    assert_eq!(json["op"]["id"]["wall_ms"], 1000);
}

#[test]
fn ping_wire_format() {
    assert_eq!(ClientMessage::ping(7).to_json().unwrap(), r#"{"type":"ping","id":7}"#);
}

#[test]
fn client_message_parses_fetch() {
    let msg = ClientMessage::from_json(r#"{"type":"fetch","key":"category:3"}"#).unwrap();
    assert_eq!(msg, ClientMessage::fetch("category:3"));
}

#[test]
fn rejected_wire_format() {
    let msg = ServerMessage::rejected(OpId::new(5, 0, 0), "entity already exists", false);
    let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "rejected");
    assert_eq!(json["retryable"], false);
    assert_eq!(ServerMessage::from_json(&msg.to_json().unwrap()).unwrap(), msg);
}

#[test]
fn server_message_parses_value() {
    let msg =
        ServerMessage::from_json(r#"{"type":"value","key":"product:1","value":{"price":3}}"#)
            .unwrap();
    assert_eq!(msg, ServerMessage::value("product:1", json!({"price": 3})));
}

#[test]
fn unknown_type_is_an_error() {
    assert!(ServerMessage::from_json(r#"{"type":"broadcast"}"#).is_err());
}
