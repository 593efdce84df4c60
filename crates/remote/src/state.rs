// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Holds the canonical entity values and the set of operation ids already
//! applied, so a client replaying an operation is acknowledged without the
//! write landing twice.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use sfs_core::protocol::ServerMessage;
use sfs_core::{OpId, OpKind, QueuedOperation};

/// Shared server state. Cheap to clone; all clones see the same entities.
#[derive(Clone, Default)]
pub struct ServerState {
    inner: Arc<Mutex<Entities>>,
}

#[derive(Default)]
struct Entities {
    values: HashMap<String, serde_json::Value>,
    applied: HashSet<OpId>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one submitted operation and returns the reply for the client.
    pub async fn apply(&self, op: &QueuedOperation) -> ServerMessage {
        let mut entities = self.inner.lock().await;

        if entities.applied.contains(&op.id) {
            debug!(id = %op.id, "duplicate submission acknowledged");
            return ServerMessage::ack(op.id);
        }

        let exists = entities.values.contains_key(&op.entity_key);
        match op.kind {
            OpKind::Create if exists => {
                return ServerMessage::rejected(
                    op.id,
                    format!("{} already exists", op.entity_key),
                    false,
                );
            }
            OpKind::Update if !exists => {
                return ServerMessage::rejected(
                    op.id,
                    format!("{} does not exist", op.entity_key),
                    false,
                );
            }
            OpKind::Create | OpKind::Update if op.payload.is_null() => {
                return ServerMessage::rejected(
                    op.id,
                    format!("{} needs a payload", op.kind),
                    false,
                );
            }
            OpKind::Create | OpKind::Update => {
                entities.values.insert(op.entity_key.clone(), op.payload.clone());
            }
            OpKind::Delete => {
                entities.values.remove(&op.entity_key);
            }
        }

        entities.applied.insert(op.id);
        debug!(id = %op.id, kind = %op.kind, key = %op.entity_key, "applied");
        ServerMessage::ack(op.id)
    }

    /// Answers a fetch for one entity.
    pub async fn fetch(&self, key: &str) -> ServerMessage {
        let entities = self.inner.lock().await;
        match entities.values.get(key) {
            Some(value) => ServerMessage::value(key, value.clone()),
            None => ServerMessage::not_found(key),
        }
    }

    /// Current value of an entity, if any.
    #[cfg(test)]
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.lock().await.values.get(key).cloned()
    }

    /// Number of distinct operations applied so far.
    #[cfg(test)]
    pub async fn applied_count(&self) -> usize {
        self.inner.lock().await.applied.len()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
