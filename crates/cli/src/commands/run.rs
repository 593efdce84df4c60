// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground sync loop.
//!
//! Keeps the connectivity monitor and auto-drain running until interrupted,
//! reporting every status change.

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<()> {
    let queue = ctx.queue()?;
    let backend = ctx.backend();
    let connectivity = ctx.connectivity(&backend);
    let engine = crate::sync::SyncEngine::new(queue, backend, connectivity, ctx.config.sync.clone());

    tracing::info!(
        url = %ctx.config.remote.url,
        state_dir = %ctx.state_dir.display(),
        pending = engine.status().pending_count,
        "sync loop started"
    );
    let drain_task = engine.spawn_auto_drain();
    let mut status = engine.subscribe_status();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                tracing::info!(
                    online = current.is_online,
                    syncing = current.is_syncing,
                    pending = current.pending_count,
                    failed = current.failed_count,
                    "status"
                );
            }
        }
    }

    tracing::info!("shutting down");
    engine.shutdown();
    engine.connectivity().shutdown();
    if let Err(e) = drain_task.await {
        tracing::warn!(error = %e, "auto drain task ended abnormally");
    }
    Ok(())
}
