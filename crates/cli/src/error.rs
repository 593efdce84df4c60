// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sfs_core::OpId;
use thiserror::Error;

use crate::sync::FetchError;

/// All possible errors that can occur in the sfsync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("local store unavailable: {0}\n  hint: the action was not recorded")]
    PersistenceUnavailable(String),

    #[error("remote unreachable: {0}")]
    RetryableNetwork(String),

    #[error("operation {id} rejected: {reason}\n  hint: fix the data and retry it, or discard it")]
    FatalOperation { id: OpId, reason: String },

    #[error("stored data under '{key}' is unreadable: {reason}\n  hint: run 'sfs queue reset' to discard it")]
    CorruptSnapshot { key: String, reason: String },

    #[error("no operation with id {0} in the queue")]
    OperationNotFound(OpId),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(sfs_core::Error),
}

/// A specialized Result type for sfsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<sfs_core::Error> for Error {
    fn from(e: sfs_core::Error) -> Self {
        match e {
            sfs_core::Error::StoreUnavailable(reason) => Error::PersistenceUnavailable(reason),
            sfs_core::Error::Database(e) => Error::PersistenceUnavailable(e.to_string()),
            sfs_core::Error::Io(e) => Error::Io(e),
            sfs_core::Error::Json(e) => Error::Json(e),
            other => Error::Core(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
