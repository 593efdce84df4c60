// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read cache entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last successful response for one query key.
///
/// Superseded wholesale by every successful live fetch; never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: serde_json::Value, fetched_at: DateTime<Utc>) -> Self {
        CacheEntry { key: key.into(), value, fetched_at }
    }

    /// How long ago the value was fetched, relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }
}
