// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn op_id_ordering() {
    // Higher wall_ms wins
    assert!(OpId::new(200, 0, 0) > OpId::new(100, 9, 9));

    // Same wall_ms, higher seq wins
    assert!(OpId::new(100, 2, 0) > OpId::new(100, 1, 9));

    // Same wall_ms and seq, node breaks the tie
    assert!(OpId::new(100, 1, 2) > OpId::new(100, 1, 1));

    assert!(OpId::new(1, 0, 0) > OpId::min());
}

#[test]
fn op_id_parse_roundtrip() {
    let original = OpId::new(1_700_000_000_123, 42, 7);
    let s = original.to_string();
    assert_eq!(s, "1700000000123-42-7");
    let parsed: OpId = s.parse().unwrap();
    assert_eq!(original, parsed);
}

#[parameterized(
    invalid_word = { "invalid" },
    two_parts = { "1-2" },
    four_parts = { "1-2-3-4" },
    bad_wall = { "abc-2-0" },
    bad_seq = { "1-abc-0" },
    bad_node = { "1-2-abc" },
    negative = { "-1-2-0" },
    empty = { "" },
)]
fn op_id_parse_errors(input: &str) {
    assert!(input.parse::<OpId>().is_err());
}

#[test]
fn op_id_serde_roundtrip() {
    let id = OpId::new(5, 6, 7);
    let json = serde_json::to_string(&id).unwrap();
    let back: OpId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn generator_advances_with_wall_clock() {
    let clock = ManualClock::new(1000);
    let gen = OpIdGenerator::with_clock(&clock, 3);

    assert_eq!(gen.next_id(), OpId::new(1000, 0, 3));
    clock.advance(5);
    assert_eq!(gen.next_id(), OpId::new(1005, 0, 3));
}

#[test]
fn generator_increments_seq_within_same_millisecond() {
    let clock = ManualClock::new(1000);
    let gen = OpIdGenerator::with_clock(&clock, 3);

    let a = gen.next_id();
    let b = gen.next_id();
    let c = gen.next_id();
    assert_eq!(a, OpId::new(1000, 0, 3));
    assert_eq!(b, OpId::new(1000, 1, 3));
    assert_eq!(c, OpId::new(1000, 2, 3));
}

#[test]
fn generator_is_monotonic_when_clock_goes_backwards() {
    let clock = ManualClock::new(5000);
    let gen = OpIdGenerator::with_clock(&clock, 3);

    let before = gen.next_id();
    clock.set(1000);
    let after = gen.next_id();
    assert!(after > before);
}

#[test]
fn generator_resume_never_reissues() {
    let clock = ManualClock::new(1000);
    // Persisted high-water mark is ahead of the current wall clock.
    let gen = OpIdGenerator::resume(&clock, 3, OpId::new(9000, 3, 3));

    let id = gen.next_id();
    assert_eq!(id, OpId::new(9000, 4, 3));
    assert_eq!(gen.last(), id);
}

#[test]
fn generator_observe_raises_high_water() {
    let clock = ManualClock::new(1000);
    let gen = OpIdGenerator::with_clock(&clock, 3);

    gen.observe(OpId::new(2000, 7, 9));
    assert_eq!(gen.next_id(), OpId::new(2000, 8, 3));

    // Observing an older id is a no-op
    gen.observe(OpId::new(10, 0, 9));
    assert_eq!(gen.next_id(), OpId::new(2000, 9, 3));
}

#[test]
fn generator_rolls_over_exhausted_seq() {
    let clock = ManualClock::new(10);
    let gen = OpIdGenerator::resume(&clock, 3, OpId::new(10, u32::MAX, 3));
    assert_eq!(gen.next_id(), OpId::new(11, 0, 3));
}

#[test]
fn generators_on_different_nodes_never_collide() {
    let clock = ManualClock::new(1000);
    let a = OpIdGenerator::with_clock(&clock, 1);
    let b = OpIdGenerator::with_clock(&clock, 2);

    let from_a = a.next_id();
    let from_b = b.next_id();
    assert_eq!((from_a.wall_ms, from_a.seq), (from_b.wall_ms, from_b.seq));
    assert_ne!(from_a, from_b);
    assert_eq!(from_b.node, 2);
}

#[test]
fn manual_clock_now_utc() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_utc().timestamp_millis(), 1_000);
}

#[test]
fn system_clock_is_after_epoch() {
    assert!(SystemClock.now_ms() > 0);
}
