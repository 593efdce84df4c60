// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mutation queue.
//!
//! The whole queue lives in one versioned snapshot under `queue:<name>` in the
//! local store: the active FIFO, the failed list, the id high-water mark and
//! the node id stamped on every id this queue issues.
//! Every change is persisted before it becomes visible in memory, so a failed
//! write leaves the queue exactly as it was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sfs_core::{
    envelope, queue_key, ClockSource, FailedOperation, FailureCause, LocalStore, Mutation, OpId,
    OpIdGenerator, QueuedOperation,
};

use crate::error::{Error, Result};

/// Format tag embedded in every persisted queue snapshot.
pub const QUEUE_FORMAT_VERSION: u32 = 1;

/// Persisted queue contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Highest id ever issued by this queue.
    pub last_id: OpId,
    /// Node component of issued ids. Zero until one is assigned.
    #[serde(default)]
    pub node: u32,
    /// Pending operations in ascending id order.
    pub active: Vec<QueuedOperation>,
    /// Terminal operations waiting for the user.
    #[serde(default)]
    pub failed: Vec<FailedOperation>,
}

/// What happened to an operation after a retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// Still at the head of the queue.
    Kept { attempts: u32 },
    /// Attempt ceiling reached; moved to the failed list.
    Exhausted,
}

/// FIFO queue of deferred writes backed by a [`LocalStore`].
pub struct MutationQueue {
    store: Arc<dyn LocalStore>,
    key: String,
    snapshot: QueueSnapshot,
    ids: OpIdGenerator<Arc<dyn ClockSource>>,
    clock: Arc<dyn ClockSource>,
}

impl MutationQueue {
    /// Loads the queue named `name`, or starts an empty one.
    ///
    /// An unreadable snapshot is reported as [`Error::CorruptSnapshot`] and
    /// left in place; see [`MutationQueue::reset`].
    pub fn open(
        store: Arc<dyn LocalStore>,
        name: &str,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let key = queue_key(name);
        let blob = store.get(&key)?;
        let mut snapshot = envelope::decode::<QueueSnapshot>(blob.as_deref(), QUEUE_FORMAT_VERSION)
            .map_err(|e| Error::CorruptSnapshot { key: key.clone(), reason: e.to_string() })?
            .unwrap_or_default();

        if snapshot.node == 0 {
            snapshot.node = fresh_node();
        }
        let resume_after = high_water(&snapshot);

        tracing::debug!(
            key = %key,
            node = snapshot.node,
            pending = snapshot.active.len(),
            failed = snapshot.failed.len(),
            "opened mutation queue"
        );

        let node = snapshot.node;
        Ok(MutationQueue {
            store,
            key,
            snapshot,
            ids: OpIdGenerator::resume(Arc::clone(&clock), node, resume_after),
            clock,
        })
    }

    /// Discards the persisted snapshot and starts over with an empty queue.
    ///
    /// The id high-water mark and node survive when the old snapshot is
    /// readable. An unreadable one is removed and the queue starts on a new
    /// node, so ids issued afterwards cannot collide with lost ones.
    pub fn reset(store: Arc<dyn LocalStore>, name: &str, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let key = queue_key(name);
        let blob = store.get(&key)?;
        let previous = envelope::decode::<QueueSnapshot>(blob.as_deref(), QUEUE_FORMAT_VERSION)
            .ok()
            .flatten();

        match previous {
            Some(old) => {
                let kept = QueueSnapshot {
                    last_id: high_water(&old),
                    node: old.node,
                    ..QueueSnapshot::default()
                };
                store.set(&key, &envelope::encode(QUEUE_FORMAT_VERSION, &kept)?)?;
                let dropped = old.active.len() + old.failed.len();
                tracing::warn!(key = %key, dropped, "mutation queue reset");
            }
            None => {
                store.remove(&key)?;
                tracing::warn!(key = %key, "unreadable mutation queue removed");
            }
        }
        Self::open(store, name, clock)
    }


    /// Appends a mutation and persists it before returning its id.
    pub fn enqueue(&mut self, mutation: Mutation) -> Result<OpId> {
        let id = self.ids.next_id();
        let op = QueuedOperation::from_mutation(id, mutation, self.clock.now_utc());

        let mut next = self.snapshot.clone();
        next.last_id = id;
        next.active.push(op);
        self.commit(next)?;

        tracing::debug!(id = %id, pending = self.snapshot.active.len(), "enqueued");
        Ok(id)
    }

    /// Builds an operation for a live submission without queueing it.
    ///
    /// Its id is persisted as the high-water mark so it is never issued
    /// again, even if the live submission later ends up in the queue.
    pub fn prepare(&mut self, mutation: Mutation) -> Result<QueuedOperation> {
        let id = self.ids.next_id();
        let mut next = self.snapshot.clone();
        next.last_id = id;
        self.commit(next)?;
        Ok(QueuedOperation::from_mutation(id, mutation, self.clock.now_utc()))
    }

    /// Appends an already-built operation, e.g. a live submit that failed.
    pub fn push(&mut self, op: QueuedOperation) -> Result<()> {
        self.ids.observe(op.id);
        let mut next = self.snapshot.clone();
        next.last_id = std::cmp::max(next.last_id, op.id);
        next.active.push(op);
        next.active.sort_by_key(|op| op.id);
        self.commit(next)
    }

    /// The operation that must be submitted next.
    pub fn head(&self) -> Option<&QueuedOperation> {
        self.snapshot.active.first()
    }

    pub fn peek_all(&self) -> &[QueuedOperation] {
        &self.snapshot.active
    }

    pub fn len(&self) -> usize {
        self.snapshot.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.active.is_empty()
    }

    pub fn failed(&self) -> &[FailedOperation] {
        &self.snapshot.failed
    }

    /// Removes a confirmed operation from the active queue.
    pub fn complete(&mut self, id: OpId) -> Result<()> {
        let mut next = self.snapshot.clone();
        next.active.retain(|op| op.id != id);
        self.commit(next)
    }

    /// Moves an operation the backend refused to the failed list.
    pub fn reject(&mut self, id: OpId, reason: &str) -> Result<()> {
        self.fail(id, FailureCause::Rejected, reason)
    }

    /// Records a retryable failure against `id`.
    ///
    /// The operation stays in place until `max_attempts` is reached, after
    /// which it becomes a terminal failure.
    pub fn record_retry(&mut self, id: OpId, reason: &str, max_attempts: u32) -> Result<RetryDisposition> {
        let mut next = self.snapshot.clone();
        let op = next
            .active
            .iter_mut()
            .find(|op| op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        op.attempts = op.attempts.saturating_add(1);
        op.last_error = Some(reason.to_string());
        let attempts = op.attempts;

        if attempts >= max_attempts {
            self.move_to_failed(&mut next, id, FailureCause::RetriesExhausted, reason)?;
            self.commit(next)?;
            tracing::warn!(id = %id, attempts, reason, "retries exhausted");
            return Ok(RetryDisposition::Exhausted);
        }

        self.commit(next)?;
        Ok(RetryDisposition::Kept { attempts })
    }

    /// Puts a failed operation back at the tail of the active queue.
    ///
    /// It gets a fresh id so FIFO order by id still holds, and its attempt
    /// counter starts over.
    pub fn retry_failed(&mut self, id: OpId) -> Result<OpId> {
        let mut next = self.snapshot.clone();
        let pos = next
            .failed
            .iter()
            .position(|f| f.op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        let mut op = next.failed.remove(pos).op;

        let new_id = self.ids.next_id();
        op.id = new_id;
        op.attempts = 0;
        op.last_error = None;
        op.enqueued_at = self.clock.now_utc();
        next.last_id = new_id;
        next.active.push(op);
        self.commit(next)?;

        tracing::info!(old = %id, new = %new_id, "failed operation requeued");
        Ok(new_id)
    }

    /// Drops one failed operation for good.
    pub fn discard_failed(&mut self, id: OpId) -> Result<FailedOperation> {
        let mut next = self.snapshot.clone();
        let pos = next
            .failed
            .iter()
            .position(|f| f.op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        let removed = next.failed.remove(pos);
        self.commit(next)?;
        tracing::info!(id = %id, "failed operation discarded");
        Ok(removed)
    }

    /// Drops every failed operation. Returns how many were removed.
    pub fn clear_failed(&mut self) -> Result<usize> {
        let count = self.snapshot.failed.len();
        if count == 0 {
            return Ok(0);
        }
        let mut next = self.snapshot.clone();
        next.failed.clear();
        self.commit(next)?;
        Ok(count)
    }

    fn fail(&mut self, id: OpId, cause: FailureCause, reason: &str) -> Result<()> {
        let mut next = self.snapshot.clone();
        self.move_to_failed(&mut next, id, cause, reason)?;
        self.commit(next)?;
        tracing::warn!(id = %id, %cause, reason, "operation moved to failed list");
        Ok(())
    }

    fn move_to_failed(
        &self,
        next: &mut QueueSnapshot,
        id: OpId,
        cause: FailureCause,
        reason: &str,
    ) -> Result<()> {
        let pos = next
            .active
            .iter()
            .position(|op| op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        let mut op = next.active.remove(pos);
        op.last_error = Some(reason.to_string());
        next.failed.push(FailedOperation {
            op,
            cause,
            reason: reason.to_string(),
            failed_at: self.clock.now_utc(),
        });
        Ok(())
    }

    fn commit(&mut self, next: QueueSnapshot) -> Result<()> {
        let blob = envelope::encode(QUEUE_FORMAT_VERSION, &next)?;
        self.store.set(&self.key, &blob)?;
        self.snapshot = next;
        Ok(())
    }
}

/// Highest id recorded anywhere in `snapshot`.
fn high_water(snapshot: &QueueSnapshot) -> OpId {
    snapshot
        .active
        .iter()
        .map(|op| op.id)
        .chain(snapshot.failed.iter().map(|f| f.op.id))
        .fold(snapshot.last_id, std::cmp::max)
}

/// Picks a random non-zero node id.
fn fresh_node() -> u32 {
    rand::random::<u32>().max(1)
}

impl std::fmt::Debug for MutationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationQueue")
            .field("key", &self.key)
            .field("pending", &self.snapshot.active.len())
            .field("failed", &self.snapshot.failed.len())
            .finish()
    }
}
