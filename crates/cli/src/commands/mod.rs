// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations.
//!
//! Every command opens a [`Context`] over the state directory and builds
//! only the pieces it needs.

pub mod config;
pub mod drain;
pub mod fetch;
pub mod queue;
pub mod run;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use sfs_core::{ClockSource, LocalStore, Mutation, OpId, OpKind, SqliteStore, SystemClock};

use crate::cache::OfflineReadCache;
use crate::config::{resolve_state_dir, store_path, Config};
use crate::connectivity::ConnectivityHandle;
use crate::error::{Error, Result};
use crate::sync::{MutationQueue, Probe, SubmitOutcome, SyncEngine, WebSocketBackend};

/// Everything a command needs from the state directory.
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
    /// Skip probing and treat the backend as unreachable.
    pub offline: bool,
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn ClockSource>,
}

impl Context {
    pub fn open(state_dir: Option<PathBuf>, offline: bool) -> Result<Self> {
        let state_dir = resolve_state_dir(state_dir)?;
        let config = Config::load(&state_dir)?;
        let store = SqliteStore::open(&store_path(&state_dir))?;
        tracing::debug!(state_dir = %state_dir.display(), "opened local store");
        Ok(Context {
            state_dir,
            config,
            offline,
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn queue(&self) -> Result<MutationQueue> {
        MutationQueue::open(
            Arc::clone(&self.store),
            &self.config.sync.queue_name,
            Arc::clone(&self.clock),
        )
    }

    pub fn reset_queue(&self) -> Result<MutationQueue> {
        MutationQueue::reset(
            Arc::clone(&self.store),
            &self.config.sync.queue_name,
            Arc::clone(&self.clock),
        )
    }

    pub fn backend(&self) -> Arc<WebSocketBackend> {
        Arc::new(WebSocketBackend::new(self.config.remote.url.clone()))
    }

    pub fn cache(&self) -> OfflineReadCache {
        OfflineReadCache::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    /// Starts a connectivity monitor, or a permanently offline one.
    pub fn connectivity(&self, backend: &Arc<WebSocketBackend>) -> ConnectivityHandle {
        if self.offline {
            return ConnectivityHandle::unprobed(false, Arc::clone(&self.clock));
        }
        let probe: Arc<dyn Probe> = backend.clone();
        ConnectivityHandle::spawn(probe, self.config.connectivity.clone(), Arc::clone(&self.clock), true)
    }

    /// Builds an engine whose connectivity has had one probe to settle.
    pub async fn engine(&self) -> Result<SyncEngine> {
        let queue = self.queue()?;
        let backend = self.backend();
        let connectivity = self.connectivity(&backend);
        if !self.offline {
            let online = connectivity.wait_online(self.config.connectivity.probe_timeout()).await;
            if !online {
                tracing::info!(url = %self.config.remote.url, "backend unreachable; working offline");
            }
        }
        Ok(SyncEngine::new(queue, backend, connectivity, self.config.sync.clone()))
    }
}

/// Builds a mutation from command line arguments.
pub fn parse_mutation(kind: &str, key: &str, payload: Option<&str>) -> Result<Mutation> {
    let kind: OpKind = kind.parse()?;
    let payload = match payload {
        Some(raw) => serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))?,
        None => Value::Null,
    };
    Ok(Mutation::new(kind, key, payload))
}

pub fn parse_op_id(s: &str) -> Result<OpId> {
    Ok(OpId::parse(s)?)
}

/// Record a mutation without touching the network.
pub fn enqueue(ctx: &Context, kind: &str, key: &str, payload: Option<&str>) -> Result<()> {
    let mutation = parse_mutation(kind, key, payload)?;
    let mut queue = ctx.queue()?;
    let id = queue.enqueue(mutation)?;
    println!("Queued {} ({} pending)", id, queue.len());
    Ok(())
}

/// Apply a mutation now, or queue it.
pub async fn submit(ctx: &Context, kind: &str, key: &str, payload: Option<&str>) -> Result<()> {
    let mutation = parse_mutation(kind, key, payload)?;
    let engine = ctx.engine().await?;
    let outcome = engine.submit(mutation).await;
    engine.connectivity().shutdown();
    match outcome? {
        SubmitOutcome::Submitted(id) => println!("Submitted {}", id),
        SubmitOutcome::Queued(id) => {
            println!("Queued {} ({} pending)", id, engine.status().pending_count)
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
