// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sfs-core: Shared library for the storefront offline sync layer
//!
//! This crate provides the runtime-free building blocks used by both the
//! `sfs` sync client and the `sfs-remote` development backend: ordered
//! operation ids, queued operations, versioned blob encoding, the local
//! persistent store, and the wire protocol.

pub mod entry;
pub mod envelope;
pub mod error;
pub mod op;
pub mod op_id;
pub mod protocol;
pub mod store;

pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use op::{FailedOperation, FailureCause, Mutation, OpKind, QueuedOperation};
pub use op_id::{ClockSource, ManualClock, OpId, OpIdGenerator, SystemClock};
pub use store::{cache_key, queue_key, LocalStore, MemoryStore, SqliteStore};
