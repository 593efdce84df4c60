// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered operation identifiers.
//!
//! An [`OpId`] combines wall clock time with a sequence number so that ids
//! handed out by one queue are strictly increasing, even when the wall clock
//! stalls or steps backwards between process restarts. The node component
//! identifies the issuing queue, so two clients minting an id in the same
//! millisecond still produce distinct ids.
//!
//! Format: `{wall_ms}-{seq}-{node}`
//!
//! Ordering rules:
//! 1. Higher wall_ms wins
//! 2. If wall_ms equal, higher seq wins
//! 3. If both equal, higher node wins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// A unique, totally ordered operation identifier.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OpId {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Sequence number for ids issued within the same millisecond.
    pub seq: u32,
    /// Identifier of the issuing queue.
    pub node: u32,
}

impl OpId {
    /// Creates a new id with the given components.
    pub fn new(wall_ms: u64, seq: u32, node: u32) -> Self {
        OpId { wall_ms, seq, node }
    }

    /// The smallest possible id. Every issued id is greater than this.
    pub fn min() -> Self {
        OpId { wall_ms: 0, seq: 0, node: 0 }
    }

    /// Parses an id from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wall_ms, self.seq, self.node)
    }
}

impl FromStr for OpId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        let [wall, seq, node] = parts[..] else {
            return Err(Error::InvalidOpId(format!("expected format 'wall_ms-seq-node', got '{s}'")));
        };

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidOpId(format!("invalid wall_ms '{wall}' in '{s}'")))?;

        let seq = seq
            .parse::<u32>()
            .map_err(|_| Error::InvalidOpId(format!("invalid seq '{seq}' in '{s}'")))?;

        let node = node
            .parse::<u32>()
            .map_err(|_| Error::InvalidOpId(format!("invalid node '{node}' in '{s}'")))?;

        Ok(OpId::new(wall_ms, seq, node))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a controllable clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Returns the current time as a UTC timestamp.
    fn now_utc(&self) -> DateTime<Utc> {
        let ms = i64::try_from(self.now_ms()).unwrap_or(i64::MAX);
        DateTime::from_timestamp_millis(ms).unwrap_or_default()
    }
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    time_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(initial_ms: u64) -> Self {
        ManualClock { time_ms: AtomicU64::new(initial_ms) }
    }

    pub fn set(&self, ms: u64) {
        self.time_ms.store(ms, AtomicOrdering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.time_ms.fetch_add(ms, AtomicOrdering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.time_ms.load(AtomicOrdering::SeqCst)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Generates strictly increasing [`OpId`]s for one node.
///
/// The generator remembers the last id it issued. Seed it with the persisted
/// high-water mark via [`OpIdGenerator::resume`] so ids keep increasing after
/// a restart.
pub struct OpIdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    node: u32,
    last: Mutex<OpId>,
}

impl<C: ClockSource> OpIdGenerator<C> {
    /// Creates a generator with a custom clock source.
    pub fn with_clock(clock: C, node: u32) -> Self {
        OpIdGenerator { clock, node, last: Mutex::new(OpId::min()) }
    }

    /// Creates a generator that will only issue ids greater than `after`.
    pub fn resume(clock: C, node: u32, after: OpId) -> Self {
        OpIdGenerator { clock, node, last: Mutex::new(after) }
    }

    /// Returns the last id issued (or the resume point).
    pub fn last(&self) -> OpId {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues the next id.
    pub fn next_id(&self) -> OpId {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let id = if physical > last.wall_ms {
            OpId::new(physical, 0, self.node)
        } else if last.seq == u32::MAX {
            // Sequence space for this millisecond is spent; borrow the next one.
            OpId::new(last.wall_ms + 1, 0, self.node)
        } else {
            OpId::new(last.wall_ms, last.seq + 1, self.node)
        };

        *last = id;
        id
    }

    /// Raises the high-water mark so future ids are greater than `seen`.
    pub fn observe(&self, seen: OpId) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if seen > *last {
            *last = seen;
        }
    }
}

#[cfg(test)]
#[path = "op_id_tests.rs"]
mod tests;
