// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Probe-confirmed connectivity tracking.
//!
//! Platform online/offline signals are only hints: "online" is reported
//! prematurely often enough that the monitor never trusts it on its own.
//! An online hint starts a reachability probe against the backend, and the
//! public state flips to online only once a probe succeeds. Failed probes are
//! retried with exponential backoff for as long as the platform still claims
//! to be online.
//!
//! ```text
//!            signal(on)               probe ok
//! Offline ─────────────► Probing ─────────────► Online
//!    ▲                    │  ▲ probe failed       │
//!    │   signal(off)      │  └─(backoff)──────────┤ recheck failed
//!    └────────────────────┴───────────────────────┘ signal(off)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sfs_core::ClockSource;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectivityConfig;
use crate::sync::Probe;

const EVENT_CAPACITY: usize = 16;

/// The published connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
    pub last_change_at: DateTime<Utc>,
}

/// Fired once per genuine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEvent {
    pub online: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Offline,
    Probing { failures: u32 },
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Signal(bool),
    ProbeSucceeded,
    ProbeFailed,
}

/// What to do with the probe timer after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    /// Leave any pending probe alone.
    Keep,
    /// Drop any pending probe.
    Cancel,
    Now,
    After(Duration),
}

/// The monitor's decision logic, free of timers and I/O.
#[derive(Debug)]
struct Monitor {
    phase: Phase,
    config: ConnectivityConfig,
}

impl Monitor {
    fn new(config: ConnectivityConfig) -> Self {
        Monitor { phase: Phase::Offline, config }
    }

    fn failures(&self) -> u32 {
        match self.phase {
            Phase::Probing { failures } => failures,
            _ => 0,
        }
    }

    fn recheck(&self) -> Schedule {
        self.config.recheck_interval().map_or(Schedule::Cancel, Schedule::After)
    }

    /// Applies one input. Returns the probe schedule and, when the public
    /// state flipped, the new value.
    fn step(&mut self, input: Input) -> (Schedule, Option<bool>) {
        match (self.phase, input) {
            (Phase::Offline, Input::Signal(true)) => {
                self.phase = Phase::Probing { failures: 0 };
                (Schedule::Now, None)
            }
            // Results of probes cancelled by an offline signal.
            (Phase::Offline, _) => (Schedule::Keep, None),

            (Phase::Probing { .. }, Input::Signal(true)) => (Schedule::Keep, None),
            (Phase::Probing { .. }, Input::Signal(false)) => {
                self.phase = Phase::Offline;
                (Schedule::Cancel, None)
            }
            (Phase::Probing { .. }, Input::ProbeSucceeded) => {
                self.phase = Phase::Online;
                (self.recheck(), Some(true))
            }
            (Phase::Probing { failures }, Input::ProbeFailed) => {
                let failures = failures.saturating_add(1);
                self.phase = Phase::Probing { failures };
                (Schedule::After(self.config.probe_delay(failures)), None)
            }

            (Phase::Online, Input::Signal(true)) => (Schedule::Keep, None),
            (Phase::Online, Input::Signal(false)) => {
                self.phase = Phase::Offline;
                (Schedule::Cancel, Some(false))
            }
            (Phase::Online, Input::ProbeSucceeded) => (self.recheck(), None),
            (Phase::Online, Input::ProbeFailed) => {
                self.phase = Phase::Probing { failures: 1 };
                (Schedule::After(self.config.probe_delay(1)), Some(false))
            }
        }
    }
}

/// State shared by every handle and the probe task.
struct Shared {
    state: watch::Sender<ConnectivityState>,
    events: broadcast::Sender<ConnectivityEvent>,
    failures: AtomicU32,
    clock: Arc<dyn ClockSource>,
}

impl Shared {
    fn new(online: bool, clock: Arc<dyn ClockSource>) -> Self {
        let initial = ConnectivityState { online, last_change_at: clock.now_utc() };
        let (state, _) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Shared { state, events, failures: AtomicU32::new(0), clock }
    }

    /// Publishes `online` if it differs from the current state.
    fn publish(&self, online: bool) -> bool {
        let at = self.clock.now_utc();
        let changed = self.state.send_if_modified(|state| {
            if state.online == online {
                return false;
            }
            *state = ConnectivityState { online, last_change_at: at };
            true
        });
        if changed {
            tracing::info!(online, "connectivity changed");
            // No subscribers is fine.
            let _ = self.events.send(ConnectivityEvent { online, at });
        }
        changed
    }
}

enum Driver {
    /// Signals go to the probe task.
    Probed { signals: mpsc::UnboundedSender<bool>, cancel: CancellationToken },
    /// Signals are trusted as-is.
    Direct,
}

/// Handle to a running connectivity monitor. Cheap to clone.
#[derive(Clone)]
pub struct ConnectivityHandle {
    shared: Arc<Shared>,
    driver: Arc<Driver>,
}

impl ConnectivityHandle {
    /// Starts a monitor that confirms online hints with `probe`.
    ///
    /// `initial_signal` is the platform's current claim. The published state
    /// starts offline either way. Must be called from within a tokio runtime.
    pub fn spawn(
        probe: Arc<dyn Probe>,
        config: ConnectivityConfig,
        clock: Arc<dyn ClockSource>,
        initial_signal: bool,
    ) -> Self {
        let shared = Arc::new(Shared::new(false, clock));
        let (signals, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(run_monitor(
            Monitor::new(config),
            probe,
            Arc::clone(&shared),
            rx,
            cancel.clone(),
        ));
        if initial_signal {
            let _ = signals.send(true);
        }

        ConnectivityHandle { shared, driver: Arc::new(Driver::Probed { signals, cancel }) }
    }

    /// A monitor without probing: platform signals are the state.
    pub fn unprobed(online: bool, clock: Arc<dyn ClockSource>) -> Self {
        ConnectivityHandle {
            shared: Arc::new(Shared::new(online, clock)),
            driver: Arc::new(Driver::Direct),
        }
    }

    /// Feeds a platform online/offline signal.
    pub fn signal(&self, online: bool) {
        match self.driver.as_ref() {
            Driver::Probed { signals, .. } => {
                if signals.send(online).is_err() {
                    tracing::debug!(online, "connectivity monitor stopped; signal ignored");
                }
            }
            Driver::Direct => {
                self.shared.publish(online);
            }
        }
    }

    pub fn is_online(&self) -> bool {
        self.shared.state.borrow().online
    }

    pub fn state(&self) -> ConnectivityState {
        *self.shared.state.borrow()
    }

    /// Consecutive failed reachability checks since the last online hint.
    pub fn failed_checks(&self) -> u32 {
        self.shared.failures.load(Ordering::Acquire)
    }

    /// Receiver that always holds the latest state.
    pub fn watch(&self) -> watch::Receiver<ConnectivityState> {
        self.shared.state.subscribe()
    }

    /// Receiver for transition events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.shared.events.subscribe()
    }

    /// Waits up to `limit` for the state to become online.
    pub async fn wait_online(&self, limit: Duration) -> bool {
        let mut state = self.watch();
        let reached = tokio::time::timeout(limit, state.wait_for(|s| s.online)).await;
        matches!(reached, Ok(Ok(_)))
    }

    /// Stops the probe task. The last published state is kept.
    pub fn shutdown(&self) {
        if let Driver::Probed { cancel, .. } = self.driver.as_ref() {
            cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ConnectivityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityHandle").field("state", &self.state()).finish()
    }
}

type ProbeTask = Pin<Box<dyn Future<Output = bool> + Send>>;

fn schedule_probe(probe: &Arc<dyn Probe>, at: Instant, timeout: Duration) -> ProbeTask {
    let probe = Arc::clone(probe);
    Box::pin(async move {
        tokio::time::sleep_until(at).await;
        match tokio::time::timeout(timeout, probe.probe()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(?timeout, "probe timed out");
                false
            }
        }
    })
}

async fn wait_probe(task: &mut Option<ProbeTask>) -> bool {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

async fn run_monitor(
    mut monitor: Monitor,
    probe: Arc<dyn Probe>,
    shared: Arc<Shared>,
    mut signals: mpsc::UnboundedReceiver<bool>,
    cancel: CancellationToken,
) {
    let timeout = monitor.config.probe_timeout();
    let mut pending: Option<ProbeTask> = None;

    loop {
        let input = tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signals.recv() => match signal {
                Some(online) => Input::Signal(online),
                None => break,
            },
            ok = wait_probe(&mut pending) => {
                if ok { Input::ProbeSucceeded } else { Input::ProbeFailed }
            }
        };
        if matches!(input, Input::ProbeSucceeded | Input::ProbeFailed) {
            pending = None;
        }

        let (schedule, transition) = monitor.step(input);
        tracing::trace!(?input, phase = ?monitor.phase, ?schedule, "connectivity step");

        match schedule {
            Schedule::Keep => {}
            Schedule::Cancel => pending = None,
            Schedule::Now => pending = Some(schedule_probe(&probe, Instant::now(), timeout)),
            Schedule::After(delay) => {
                if monitor.failures() > 0 {
                    tracing::debug!(failures = monitor.failures(), ?delay, "retrying probe");
                }
                pending = Some(schedule_probe(&probe, Instant::now() + delay, timeout));
            }
        }

        shared.failures.store(monitor.failures(), Ordering::Release);
        if let Some(online) = transition {
            shared.publish(online);
        }
    }

    tracing::debug!("connectivity monitor stopped");
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
