// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred write operations.
//!
//! Every mutation the storefront wants to push to the remote backend is
//! represented as a [`QueuedOperation`]. Operations are:
//!
//! - Serializable: stored in the local queue snapshot and sent over the wire
//! - Ordered: drained strictly in ascending [`OpId`] order
//! - Replay-safe: the id travels with the operation so the backend can
//!   recognise a resubmission

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::op_id::OpId;

/// What a mutation does to the remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OpKind::Create),
            "update" => Ok(OpKind::Update),
            "delete" => Ok(OpKind::Delete),
            _ => Err(Error::InvalidOpKind(s.to_string())),
        }
    }
}

/// A write the caller wants applied remotely. Input to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: OpKind,
    pub entity_key: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Mutation {
    pub fn new(kind: OpKind, entity_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Mutation { kind, entity_key: entity_key.into(), payload }
    }

    pub fn create(entity_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(OpKind::Create, entity_key, payload)
    }

    pub fn update(entity_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(OpKind::Update, entity_key, payload)
    }

    pub fn delete(entity_key: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, entity_key, serde_json::Value::Null)
    }
}

/// One deferred write waiting in the active queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Unique, ordered identifier. Drain order is ascending id.
    pub id: OpId,
    pub kind: OpKind,
    pub entity_key: String,
    /// Opaque JSON body forwarded to the backend.
    #[serde(default)]
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
    /// Number of failed submission attempts so far.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedOperation {
    /// Builds a fresh operation from a caller mutation.
    pub fn from_mutation(id: OpId, mutation: Mutation, enqueued_at: DateTime<Utc>) -> Self {
        QueuedOperation {
            id,
            kind: mutation.kind,
            entity_key: mutation.entity_key,
            payload: mutation.payload,
            enqueued_at,
            attempts: 0,
            last_error: None,
        }
    }

    /// The caller-visible part of this operation.
    pub fn mutation(&self) -> Mutation {
        Mutation::new(self.kind, self.entity_key.clone(), self.payload.clone())
    }
}

/// Why an operation left the active queue without succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The backend refused it (validation, conflict).
    Rejected,
    /// Retryable failures hit the configured attempt ceiling.
    RetriesExhausted,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Rejected => f.write_str("rejected"),
            FailureCause::RetriesExhausted => f.write_str("retries exhausted"),
        }
    }
}

/// A terminal item kept visible until the user retries or discards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedOperation {
    pub op: QueuedOperation,
    pub cause: FailureCause,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
