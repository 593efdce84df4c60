// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between a sync client and the backend.
//!
//! The protocol is strictly request/response:
//! - Client submits one operation, fetches one key, or pings
//! - Server answers each request with exactly one message

use serde::{Deserialize, Serialize};

use crate::op::QueuedOperation;
use crate::op_id::OpId;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Apply one queued operation.
    ///
    /// The server answers `Ack` or `Rejected` for the same id. Resubmitting
    /// an already-applied id is acknowledged without applying it twice.
    Submit {
        op: QueuedOperation,
    },

    /// Read the current value of an entity.
    Fetch {
        key: String,
    },

    /// Reachability probe.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The operation was applied (or had already been applied).
    Ack {
        id: OpId,
    },

    /// The operation was not applied.
    Rejected {
        id: OpId,
        reason: String,
        /// True when the same operation may succeed later unchanged.
        retryable: bool,
    },

    /// Response to a Fetch.
    Value {
        key: String,
        value: serde_json::Value,
    },

    /// Response to a Fetch for an unknown key.
    NotFound {
        key: String,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Request could not be processed.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Submit message.
    pub fn submit(op: QueuedOperation) -> Self {
        ClientMessage::Submit { op }
    }

    /// Creates a Fetch message.
    pub fn fetch(key: impl Into<String>) -> Self {
        ClientMessage::Fetch { key: key.into() }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn ack(id: OpId) -> Self {
        ServerMessage::Ack { id }
    }

    pub fn rejected(id: OpId, reason: impl Into<String>, retryable: bool) -> Self {
        ServerMessage::Rejected { id, reason: reason.into(), retryable }
    }

    pub fn value(key: impl Into<String>, value: serde_json::Value) -> Self {
        ServerMessage::Value { key: key.into(), value }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        ServerMessage::NotFound { key: key.into() }
    }

    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
