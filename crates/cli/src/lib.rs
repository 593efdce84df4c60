// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sfsync - Offline-first sync layer for the storefront.
//!
//! Writes go through a durable mutation queue that is replayed in order once
//! the remote backend is confirmed reachable; reads go through a cache that
//! serves the last fetched value while offline.
//!
//! # Main Components
//!
//! - [`ConnectivityHandle`] - probe-confirmed online/offline state with transition events
//! - [`SyncEngine`] - enqueue, live submit and single-flight queue drain
//! - [`OfflineReadCache`] - read-through cache with stale fallback
//! - [`Config`] - `config.toml` settings
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use sfsync::{Config, ConnectivityHandle, MutationQueue, SyncEngine, WebSocketBackend};
//!
//! let backend = Arc::new(WebSocketBackend::new(config.remote.url.clone()));
//! let connectivity = ConnectivityHandle::spawn(backend.clone(), config.connectivity.clone(), clock.clone(), true);
//! let queue = MutationQueue::open(store, &config.sync.queue_name, clock)?;
//! let engine = SyncEngine::new(queue, backend, connectivity, config.sync.clone());
//! engine.spawn_auto_drain();
//!
//! engine.enqueue(Mutation::update("product:1", json!({ "price": 12 })))?;
//! ```

mod cli;
mod commands;

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod env;
pub mod error;
pub mod sync;

pub use cache::{CachedValue, OfflineReadCache};
pub use cli::{Cli, Command, ConfigCommand, OutputFormat, QueueCommand};
pub use config::Config;
pub use connectivity::{ConnectivityEvent, ConnectivityHandle, ConnectivityState};
pub use error::{Error, Result};
pub use sync::{
    DrainOutcome, DrainReport, MutationQueue, SubmitOutcome, SyncEngine, SyncStatus,
    WebSocketBackend,
};

use commands::Context;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let Cli { state_dir, offline, command, .. } = cli;

    if let Command::Config(command) = command {
        return match command {
            ConfigCommand::Show => commands::config::show(state_dir),
            ConfigCommand::Init { url } => commands::config::init(state_dir, url),
        };
    }

    let ctx = Context::open(state_dir, offline)?;
    match command {
        Command::Status { output } => commands::status::run(&ctx, output).await,
        Command::Enqueue { mutation } => commands::enqueue(
            &ctx,
            &mutation.kind,
            &mutation.key,
            mutation.payload.as_deref(),
        ),
        Command::Submit { mutation } => {
            commands::submit(&ctx, &mutation.kind, &mutation.key, mutation.payload.as_deref()).await
        }
        Command::Drain { output } => commands::drain::run(&ctx, output).await,
        Command::Fetch { key, output } => commands::fetch::run(&ctx, &key, output).await,
        Command::Failed { output } => commands::queue::failed(&ctx, output),
        Command::Retry { id, all } => commands::queue::retry(&ctx, id.as_deref(), all),
        Command::Discard { id, all } => commands::queue::discard(&ctx, id.as_deref(), all),
        Command::Queue(QueueCommand::List { output }) => commands::queue::list(&ctx, output),
        Command::Queue(QueueCommand::Reset) => commands::queue::reset(&ctx),
        Command::Run => commands::run::run(&ctx).await,
        Command::Config(_) => Ok(()),
    }
}
