// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::Utc;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    create = { "create", OpKind::Create },
    update = { "update", OpKind::Update },
    delete = { "delete", OpKind::Delete },
    upper = { "DELETE", OpKind::Delete },
)]
fn op_kind_parse(input: &str, expected: OpKind) {
    assert_eq!(input.parse::<OpKind>().unwrap(), expected);
}

#[test]
fn op_kind_parse_invalid() {
    let err = "upsert".parse::<OpKind>().unwrap_err();
    assert!(matches!(err, Error::InvalidOpKind(ref s) if s == "upsert"));
}

#[test]
fn op_kind_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&OpKind::Update).unwrap(), "\"update\"");
}

#[test]
fn from_mutation_starts_clean() {
    let now = Utc::now();
    let op = QueuedOperation::from_mutation(
        OpId::new(10, 0, 0),
        Mutation::update("product:1", json!({"price": 10})),
        now,
    );
    assert_eq!(op.kind, OpKind::Update);
    assert_eq!(op.entity_key, "product:1");
    assert_eq!(op.attempts, 0);
    assert!(op.last_error.is_none());
    assert_eq!(op.enqueued_at, now);
    assert_eq!(op.mutation(), Mutation::update("product:1", json!({"price": 10})));
}

#[test]
fn delete_mutation_has_null_payload() {
    let m = Mutation::delete("category:7");
    assert_eq!(m.kind, OpKind::Delete);
    assert!(m.payload.is_null());
}

#[test]
fn queued_operation_omits_absent_last_error() {
    let op = QueuedOperation::from_mutation(OpId::new(1, 0, 0), Mutation::delete("k"), Utc::now());
    let json = serde_json::to_value(&op).unwrap();
    assert!(json.get("last_error").is_none());
    assert_eq!(json["kind"], "delete");
}

#[test]
fn queued_operation_tolerates_missing_counters() {
    // Older snapshots may lack attempts/last_error.
    let json = json!({
        "id": {"wall_ms": 5, "seq": 1, "node": 0},
        "kind": "create",
        "entity_key": "product:9",
        "payload": {"name": "Lamp"},
        "enqueued_at": "2026-01-01T00:00:00Z",
    });
    let op: QueuedOperation = serde_json::from_value(json).unwrap();
    assert_eq!(op.attempts, 0);
    assert_eq!(op.id, OpId::new(5, 1, 0));
}

#[test]
fn failure_cause_display() {
    assert_eq!(FailureCause::Rejected.to_string(), "rejected");
    assert_eq!(FailureCause::RetriesExhausted.to_string(), "retries exhausted");
}
