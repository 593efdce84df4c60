// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sfs-core operations.

use thiserror::Error;

/// All possible errors that can occur in sfs-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("unsupported format version {found} (expected {expected})\n  hint: data written by a different release can be discarded with a reset")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid operation id: {0}")]
    InvalidOpId(String),

    #[error("invalid operation kind: '{0}'\n  hint: valid kinds are: create, update, delete")]
    InvalidOpKind(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sfs-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
