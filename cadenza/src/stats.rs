/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Lock-free dispatch counters.
//!
//! The executive and the workers bump these from the hot path with relaxed
//! atomics; callers read a coherent-enough [`StatsSnapshot`] through
//! [`ExecStats::snapshot`].  This is the observability hook the scenario
//! tests drive, so counting must never require a descriptor mutex.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between the executive thread, the workers and the
/// owning façade.
#[derive(Debug, Default)]
pub(crate) struct ExecStats {
    frames: AtomicU64,
    deadline_misses: AtomicU64,
    ap_deadline_misses: AtomicU64,
    ap_releases: AtomicU64,
    release_conflicts: AtomicU64,
    task_panics: AtomicU64,
}

impl ExecStats {
    pub(crate) fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deadline_miss(&self) {
        self.deadline_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ap_deadline_miss(&self) {
        self.ap_deadline_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ap_release(&self) {
        self.ap_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release_conflict(&self) {
        self.release_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_task_panic(&self) {
        self.task_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
            ap_deadline_misses: self.ap_deadline_misses.load(Ordering::Relaxed),
            ap_releases: self.ap_releases.load(Ordering::Relaxed),
            release_conflicts: self.release_conflicts.load(Ordering::Relaxed),
            task_panics: self.task_panics.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Frames the executive has completed (slept through and audited).
    pub frames: u64,
    /// Periodic deadline-miss reports emitted.
    pub deadline_misses: u64,
    /// Aperiodic deadline-miss reports emitted.
    pub ap_deadline_misses: u64,
    /// Aperiodic releases actually performed (after coalescing).
    pub ap_releases: u64,
    /// Releases skipped because the task was still active.
    pub release_conflicts: u64,
    /// User functions that panicked and were contained by the worker.
    pub task_panics: u64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = ExecStats::default();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn each_counter_is_independent() {
        let stats = ExecStats::default();
        stats.record_frame();
        stats.record_frame();
        stats.record_deadline_miss();
        stats.record_ap_release();

        let snap = stats.snapshot();
        assert_eq!(snap.frames, 2);
        assert_eq!(snap.deadline_misses, 1);
        assert_eq!(snap.ap_deadline_misses, 0);
        assert_eq!(snap.ap_releases, 1);
        assert_eq!(snap.release_conflicts, 0);
        assert_eq!(snap.task_panics, 0);
    }
}
