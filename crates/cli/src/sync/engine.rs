// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: drains the mutation queue against the remote backend.
//!
//! At most one drain runs at a time. A drain submits the head of the queue,
//! waits for the answer, and only then moves on, so operations reach the
//! backend strictly in id order. What happens to the head depends on the
//! answer:
//!
//! | answer                  | head operation              | drain    |
//! |-------------------------|-----------------------------|----------|
//! | success                 | removed                     | continue |
//! | fatal                   | moved to the failed list    | continue |
//! | retryable, under limit  | `attempts += 1`, stays head | halt     |
//! | retryable, at limit     | moved to the failed list    | continue |
//!
//! A drain also halts as soon as connectivity drops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use sfs_core::{FailedOperation, Mutation, OpId, QueuedOperation};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backend::{RemoteBackend, SubmitError};
use super::queue::{MutationQueue, RetryDisposition};
use super::transport::WebSocketBackend;
use crate::config::SyncConfig;
use crate::connectivity::ConnectivityHandle;
use crate::error::{Error, Result};

/// What the presentation layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub is_online: bool,
    /// True strictly while a drain is running.
    pub is_syncing: bool,
    /// Operations in the active queue.
    pub pending_count: usize,
    /// Terminal operations waiting for retry or discard.
    pub failed_count: usize,
}

/// Result of [`SyncEngine::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Applied by the backend.
    Submitted(OpId),
    /// Recorded in the queue for a later drain.
    Queued(OpId),
}

impl SubmitOutcome {
    pub fn id(&self) -> OpId {
        match self {
            SubmitOutcome::Submitted(id) | SubmitOutcome::Queued(id) => *id,
        }
    }
}

/// Why a drain stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was running; nothing was done.
    AlreadyRunning,
    /// Offline before the first submission.
    Offline,
    /// The active queue is empty.
    Drained,
    /// The head failed with a retryable error and stays queued.
    Halted { id: OpId, attempts: u32, reason: String },
    /// Connectivity dropped mid-drain.
    Disconnected,
    /// The local store refused a write; the head stays queued.
    PersistenceFailed(String),
}

/// Summary of one [`SyncEngine::process_queue`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    /// Operations confirmed by the backend.
    pub submitted: usize,
    /// Operations moved to the failed list.
    pub failed: usize,
    /// Operations still pending afterwards.
    pub remaining: usize,
}

struct Inner<B> {
    queue: Mutex<MutationQueue>,
    backend: Arc<B>,
    connectivity: ConnectivityHandle,
    config: SyncConfig,
    syncing: AtomicBool,
    status: watch::Sender<SyncStatus>,
    retry_pending: AtomicBool,
    cancel: CancellationToken,
}

/// Releases the drain slot when a drain ends, however it ends.
struct SyncingGuard<'a, B: RemoteBackend + 'static> {
    engine: &'a SyncEngine<B>,
}

impl<B: RemoteBackend + 'static> Drop for SyncingGuard<'_, B> {
    fn drop(&mut self) {
        self.engine.inner.syncing.store(false, Ordering::Release);
        self.engine.refresh_status();
    }
}

enum Step {
    Done,
    Failed,
    Retry(RetryDisposition),
}

/// Offline-first write path. Cheap to clone; clones share one queue.
pub struct SyncEngine<B: RemoteBackend + 'static = WebSocketBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: RemoteBackend + 'static> Clone for SyncEngine<B> {
    fn clone(&self) -> Self {
        SyncEngine { inner: Arc::clone(&self.inner) }
    }
}

impl<B: RemoteBackend + 'static> SyncEngine<B> {
    pub fn new(
        queue: MutationQueue,
        backend: Arc<B>,
        connectivity: ConnectivityHandle,
        config: SyncConfig,
    ) -> Self {
        let initial = SyncStatus {
            is_online: connectivity.is_online(),
            is_syncing: false,
            pending_count: queue.len(),
            failed_count: queue.failed().len(),
        };
        let (status, _) = watch::channel(initial);
        SyncEngine {
            inner: Arc::new(Inner {
                queue: Mutex::new(queue),
                backend,
                connectivity,
                config,
                syncing: AtomicBool::new(false),
                status,
                retry_pending: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn connectivity(&self) -> &ConnectivityHandle {
        &self.inner.connectivity
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    /// Records a mutation for later submission. Never touches the network.
    pub fn enqueue(&self, mutation: Mutation) -> Result<OpId> {
        let id = self.queue().enqueue(mutation)?;
        self.refresh_status();
        Ok(id)
    }

    /// Applies a mutation now if possible, otherwise queues it.
    ///
    /// The live path is taken only when online, the queue is empty and no
    /// drain is running; anything else would let this mutation overtake
    /// earlier ones. A retryable failure queues the operation. A fatal one is
    /// returned to the caller and nothing is queued.
    pub async fn submit(&self, mutation: Mutation) -> Result<SubmitOutcome> {
        if !self.inner.connectivity.is_online() {
            return self.enqueue(mutation).map(SubmitOutcome::Queued);
        }
        let Some(_guard) = self.begin_sync() else {
            return self.enqueue(mutation).map(SubmitOutcome::Queued);
        };

        let mut op = {
            let mut queue = self.queue();
            if !queue.is_empty() {
                let id = queue.enqueue(mutation)?;
                tracing::debug!(id = %id, "queued behind pending operations");
                return Ok(SubmitOutcome::Queued(id));
            }
            queue.prepare(mutation)?
        };

        match self.submit_with_timeout(&op).await {
            Ok(()) => {
                tracing::debug!(id = %op.id, "submitted live");
                Ok(SubmitOutcome::Submitted(op.id))
            }
            Err(SubmitError::Retryable(reason)) => {
                tracing::info!(id = %op.id, %reason, "live submit failed; queued");
                let id = op.id;
                op.attempts = 1;
                op.last_error = Some(reason);
                self.queue().push(op)?;
                self.schedule_retry(1);
                Ok(SubmitOutcome::Queued(id))
            }
            Err(SubmitError::Fatal(reason)) => Err(Error::FatalOperation { id: op.id, reason }),
        }
    }

    /// Drains the queue against the backend.
    ///
    /// Returns immediately with [`DrainOutcome::AlreadyRunning`] if another
    /// drain holds the slot.
    pub async fn process_queue(&self) -> DrainReport {
        let Some(_guard) = self.begin_sync() else {
            tracing::debug!("drain already running");
            return self.report(DrainOutcome::AlreadyRunning, 0, 0);
        };

        let mut submitted = 0;
        let mut failed = 0;
        let outcome = loop {
            if self.inner.cancel.is_cancelled() || !self.inner.connectivity.is_online() {
                break if submitted + failed == 0 {
                    DrainOutcome::Offline
                } else {
                    DrainOutcome::Disconnected
                };
            }
            let head = self.queue().head().cloned();
            let Some(op) = head else {
                break DrainOutcome::Drained;
            };

            let result = self.submit_with_timeout(&op).await;
            let step = {
                let mut queue = self.queue();
                match &result {
                    Ok(()) => queue.complete(op.id).map(|()| Step::Done),
                    Err(SubmitError::Fatal(reason)) => {
                        queue.reject(op.id, reason).map(|()| Step::Failed)
                    }
                    Err(SubmitError::Retryable(reason)) => queue
                        .record_retry(op.id, reason, self.inner.config.max_attempts)
                        .map(Step::Retry),
                }
            };

            match step {
                Ok(Step::Done) => submitted += 1,
                Ok(Step::Failed) | Ok(Step::Retry(RetryDisposition::Exhausted)) => failed += 1,
                Ok(Step::Retry(RetryDisposition::Kept { attempts })) => {
                    let reason = result.err().map(|e| e.reason().to_string()).unwrap_or_default();
                    tracing::info!(id = %op.id, attempts, %reason, "drain halted on retryable failure");
                    self.schedule_retry(attempts);
                    break DrainOutcome::Halted { id: op.id, attempts, reason };
                }
                Err(e) => {
                    tracing::error!(id = %op.id, error = %e, "could not persist drain progress");
                    break DrainOutcome::PersistenceFailed(e.to_string());
                }
            }
            self.refresh_status();
        };

        let report = self.report(outcome, submitted, failed);
        tracing::debug!(?report, "drain finished");
        report
    }

    /// Snapshot of the status surface.
    pub fn status(&self) -> SyncStatus {
        let queue = self.queue();
        SyncStatus {
            is_online: self.inner.connectivity.is_online(),
            is_syncing: self.inner.syncing.load(Ordering::Acquire),
            pending_count: queue.len(),
            failed_count: queue.failed().len(),
        }
    }

    /// Receiver that holds the latest status.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn pending(&self) -> Vec<QueuedOperation> {
        self.queue().peek_all().to_vec()
    }

    pub fn failed(&self) -> Vec<FailedOperation> {
        self.queue().failed().to_vec()
    }

    /// Moves a failed operation back to the tail of the queue.
    pub fn retry_failed(&self, id: OpId) -> Result<OpId> {
        let new_id = self.queue().retry_failed(id)?;
        self.refresh_status();
        Ok(new_id)
    }

    pub fn discard_failed(&self, id: OpId) -> Result<FailedOperation> {
        let removed = self.queue().discard_failed(id)?;
        self.refresh_status();
        Ok(removed)
    }

    pub fn clear_failed(&self) -> Result<usize> {
        let count = self.queue().clear_failed()?;
        self.refresh_status();
        Ok(count)
    }

    /// Drains now if online, then again on every transition to online.
    pub fn spawn_auto_drain(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let mut events = self.inner.connectivity.subscribe();
        tokio::spawn(async move {
            if engine.inner.connectivity.is_online() {
                engine.process_queue().await;
            }
            loop {
                let event = tokio::select! {
                    _ = engine.inner.cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) if event.online => {
                        engine.refresh_status();
                        let report = engine.process_queue().await;
                        tracing::info!(
                            submitted = report.submitted,
                            failed = report.failed,
                            remaining = report.remaining,
                            "drained after reconnect"
                        );
                    }
                    Ok(_) => engine.refresh_status(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "missed connectivity events");
                        if engine.inner.connectivity.is_online() {
                            engine.process_queue().await;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("auto drain stopped");
        })
    }

    /// Stops background drains. A drain already submitting finishes its
    /// current operation and then halts.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn queue(&self) -> MutexGuard<'_, MutationQueue> {
        self.inner.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_sync(&self) -> Option<SyncingGuard<'_, B>> {
        self.inner
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.refresh_status();
        Some(SyncingGuard { engine: self })
    }

    async fn submit_with_timeout(&self, op: &QueuedOperation) -> std::result::Result<(), SubmitError> {
        let limit = self.inner.config.submit_timeout();
        match tokio::time::timeout(limit, self.inner.backend.submit(op)).await {
            Ok(result) => result,
            Err(_) => Err(SubmitError::Retryable(format!("timed out after {}ms", limit.as_millis()))),
        }
    }

    /// Arms a single timer that drains again after a backoff delay.
    fn schedule_retry(&self, attempts: u32) {
        if self.inner.retry_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let delay = self.inner.config.retry_delay(attempts);
        tracing::debug!(?delay, attempts, "retry scheduled");

        let engine = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = engine.inner.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    engine.inner.retry_pending.store(false, Ordering::Release);
                    engine.process_queue().await;
                }
            }
        });
    }

    fn report(&self, outcome: DrainOutcome, submitted: usize, failed: usize) -> DrainReport {
        DrainReport { outcome, submitted, failed, remaining: self.queue().len() }
    }

    fn refresh_status(&self) {
        let next = self.status();
        self.inner.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl<B: RemoteBackend + 'static> std::fmt::Debug for SyncEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine").field("status", &self.status()).finish()
    }
}
