// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use sfs_core::{ClockSource, LocalStore, ManualClock, MemoryStore, Mutation, QueuedOperation};
use tokio::sync::Semaphore;

use super::backend::{BackendFuture, FetchError, Probe, ProbeFailure, RemoteBackend, SubmitError};

/// Fixed starting time for test clocks: 2026-01-01T00:00:00Z.
pub const T0_MS: u64 = 1_767_225_600_000;

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(T0_MS))
}

pub fn as_store(store: &MemoryStore) -> Arc<dyn LocalStore> {
    Arc::new(store.clone())
}

pub fn as_clock(clock: &Arc<ManualClock>) -> Arc<dyn ClockSource> {
    clock.clone()
}

/// An update mutation for `key` carrying a small payload.
pub fn make_mutation(key: &str) -> Mutation {
    Mutation::update(key, json!({ "key": key }))
}

type SubmitHook = Box<dyn Fn(&QueuedOperation) + Send + Sync>;

/// Scriptable in-memory backend.
///
/// Submissions succeed unless a result was scripted for the entity key or
/// the backend is marked unreachable.
pub struct MockBackend {
    reachable: AtomicBool,
    probes: AtomicUsize,
    submitted: Mutex<Vec<QueuedOperation>>,
    scripted: Mutex<HashMap<String, VecDeque<Result<(), SubmitError>>>>,
    values: Mutex<HashMap<String, Value>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    delay: Mutex<Option<Duration>>,
    on_submit: Mutex<Option<SubmitHook>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(MockBackend {
            reachable: AtomicBool::new(true),
            probes: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
            values: Mutex::new(HashMap::new()),
            gate: Mutex::new(None),
            delay: Mutex::new(None),
            on_submit: Mutex::new(None),
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Queues results for the next submissions of `entity_key`.
    pub fn script(&self, entity_key: &str, results: Vec<Result<(), SubmitError>>) {
        self.scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(entity_key.to_string())
            .or_default()
            .extend(results);
    }

    pub fn set_value(&self, key: &str, value: Value) {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).insert(key.to_string(), value);
    }

    /// Every operation the backend accepted or refused, in arrival order.
    pub fn submitted(&self) -> Vec<QueuedOperation> {
        self.submitted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn submitted_keys(&self) -> Vec<String> {
        self.submitted().into_iter().map(|op| op.entity_key).collect()
    }

    /// Makes every submission wait for a permit on the returned semaphore.
    pub fn hold_submissions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&gate));
        gate
    }

    /// Makes every submission take `delay` before answering.
    pub fn delay_submissions(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Runs `hook` when a submission arrives, before it is answered.
    pub fn on_submit(&self, hook: impl Fn(&QueuedOperation) + Send + Sync + 'static) {
        *self.on_submit.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
    }
}

impl Probe for MockBackend {
    fn probe(&self) -> BackendFuture<'_, Result<(), ProbeFailure>> {
        Box::pin(async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(ProbeFailure("connection refused".into()))
            }
        })
    }
}

impl RemoteBackend for MockBackend {
    fn submit<'a>(&'a self, op: &'a QueuedOperation) -> BackendFuture<'a, Result<(), SubmitError>> {
        Box::pin(async move {
            let gate = self.gate.lock().unwrap_or_else(|e| e.into_inner()).clone();
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(hook) = self.on_submit.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
                hook(op);
            }
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(SubmitError::Retryable("connection refused".into()));
            }

            self.submitted.lock().unwrap_or_else(|e| e.into_inner()).push(op.clone());
            self.scripted
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get_mut(&op.entity_key)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(()))
        })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(FetchError::Unavailable("connection refused".into()));
            }
            self.values
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(key)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(key.to_string()))
        })
    }
}
