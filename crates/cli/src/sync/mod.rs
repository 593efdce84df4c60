// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first write path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Engine    │────►│   Backend   │────►│   Remote    │
//! │(SyncEngine) │◄────│   (trait)   │◄────│   Server    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   Queue     │  (queue:<name> in the local store)
//! │(MutationQ.) │
//! └─────────────┘
//! ```
//!
//! # Features
//!
//! - Durable FIFO of deferred writes, persisted before `enqueue` returns
//! - Single-flight drain that halts on retryable failures and skips fatal ones
//! - Per-submission timeout and bounded timer retry
//! - Automatic drain when connectivity comes back
//! - Injectable backend trait for testing

mod backend;
mod engine;
mod queue;
mod transport;

pub use backend::{BackendFuture, FetchError, Probe, ProbeFailure, RemoteBackend, SubmitError};
pub use engine::{DrainOutcome, DrainReport, SubmitOutcome, SyncEngine, SyncStatus};
pub use queue::{MutationQueue, QueueSnapshot, RetryDisposition, QUEUE_FORMAT_VERSION};
pub use transport::{TransportError, WebSocketBackend};

#[cfg(test)]
pub(crate) mod test_helpers;
