// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline read cache.
//!
//! Every successful live read is written to `cache:<key>` in the local store,
//! replacing whatever was there. When a live read fails, the last stored
//! value is returned instead, flagged stale and carrying the time it was
//! fetched. Without a stored value the failure goes back to the caller.
//! Nothing here retries.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sfs_core::{cache_key, envelope, CacheEntry, ClockSource, LocalStore};

use crate::error::{Error, Result};
use crate::sync::{FetchError, RemoteBackend};

/// Format tag embedded in every persisted cache entry.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A value returned by [`OfflineReadCache::read_through`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
    /// The live fetch failed and this is the last stored value.
    pub stale: bool,
}

impl CachedValue {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }
}

pub struct OfflineReadCache {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn ClockSource>,
}

impl OfflineReadCache {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn ClockSource>) -> Self {
        OfflineReadCache { store, clock }
    }

    /// Runs `fetcher`, caching its value or falling back to the cache.
    pub async fn read_through<F, Fut, E>(&self, key: &str, fetcher: F) -> std::result::Result<CachedValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
        E: Display,
    {
        let error = match fetcher().await {
            Ok(value) => {
                let fetched_at = self.clock.now_utc();
                let entry = CacheEntry::new(key, value, fetched_at);
                if let Err(e) = self.store_entry(&entry) {
                    tracing::warn!(key, error = %e, "could not cache fresh value");
                }
                return Ok(CachedValue { value: entry.value, fetched_at, stale: false });
            }
            Err(error) => error,
        };

        match self.peek(key) {
            Ok(Some(entry)) => {
                tracing::debug!(key, %error, fetched_at = %entry.fetched_at, "serving stale value");
                Ok(CachedValue { value: entry.value, fetched_at: entry.fetched_at, stale: true })
            }
            Ok(None) => Err(error),
            Err(e @ Error::CorruptSnapshot { .. }) => {
                tracing::warn!(key, error = %e, "discarding unreadable cache entry");
                if let Err(e) = self.invalidate(key) {
                    tracing::warn!(key, error = %e, "could not remove cache entry");
                }
                Err(error)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "cache unavailable");
                Err(error)
            }
        }
    }

    /// Reads `key` from `backend` through the cache. A live read that takes
    /// longer than `limit` counts as a failed one.
    ///
    /// A not-found answer is authoritative: the stale entry is dropped and
    /// the error returned.
    pub async fn read_through_backend<B>(
        &self,
        key: &str,
        backend: &B,
        limit: Duration,
    ) -> std::result::Result<CachedValue, FetchError>
    where
        B: RemoteBackend + ?Sized,
    {
        let fetched = tokio::time::timeout(limit, backend.fetch(key)).await.unwrap_or_else(|_| {
            Err(FetchError::Unavailable(format!("timed out after {}ms", limit.as_millis())))
        });
        let live = match fetched {
            Err(FetchError::NotFound(missing)) => {
                if let Err(e) = self.invalidate(key) {
                    tracing::warn!(key, error = %e, "could not remove cache entry");
                }
                return Err(FetchError::NotFound(missing));
            }
            live => live,
        };
        self.read_through(key, || std::future::ready(live)).await
    }

    /// The stored entry for `key`, without fetching.
    pub fn peek(&self, key: &str) -> Result<Option<CacheEntry>> {
        let store_key = cache_key(key);
        let blob = self.store.get(&store_key)?;
        let corrupt = |reason: String| Error::CorruptSnapshot { key: store_key.clone(), reason };

        let entry = envelope::decode::<CacheEntry>(blob.as_deref(), CACHE_FORMAT_VERSION)
            .map_err(|e| corrupt(e.to_string()))?;
        match entry {
            Some(entry) if entry.key != key => {
                Err(corrupt(format!("entry belongs to '{}'", entry.key)))
            }
            entry => Ok(entry),
        }
    }

    /// Drops the stored entry for `key`, if any.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        self.store.remove(&cache_key(key))?;
        Ok(())
    }

    fn store_entry(&self, entry: &CacheEntry) -> Result<()> {
        let blob = envelope::encode(CACHE_FORMAT_VERSION, entry)?;
        self.store.set(&cache_key(&entry.key), &blob)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
