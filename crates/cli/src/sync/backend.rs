// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Seams between the sync layer and the remote data backend.
//!
//! The engine never talks to a socket directly. It talks to a
//! [`RemoteBackend`], which classifies every failure as retryable or fatal,
//! and the connectivity monitor talks to a [`Probe`].

use std::future::Future;
use std::pin::Pin;

use sfs_core::QueuedOperation;

/// Boxed future returned by backend calls.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a submission did not land.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Transient: network failure, timeout, server hiccup. Try again later.
    #[error("retryable: {0}")]
    Retryable(String),

    /// The backend will never accept this operation.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl SubmitError {
    pub fn reason(&self) -> &str {
        match self {
            SubmitError::Retryable(r) | SubmitError::Fatal(r) => r,
        }
    }
}

/// Why a read did not return a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered and the key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend answered with an error.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// A failed reachability check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend unreachable: {0}")]
pub struct ProbeFailure(pub String);

/// Confirms the backend is actually reachable.
pub trait Probe: Send + Sync {
    fn probe(&self) -> BackendFuture<'_, Result<(), ProbeFailure>>;
}

/// The remote data backend that queued mutations are replayed against.
pub trait RemoteBackend: Probe {
    /// Applies one operation. Backends deduplicate by `op.id`, so replaying
    /// an operation whose acknowledgement was lost is harmless.
    fn submit<'a>(&'a self, op: &'a QueuedOperation) -> BackendFuture<'a, Result<(), SubmitError>>;

    /// Reads the current value for `key`.
    fn fetch<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Result<serde_json::Value, FetchError>>;
}
