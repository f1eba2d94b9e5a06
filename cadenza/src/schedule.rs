/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Immutable schedule store.
//!
//! A [`Schedule`] is frozen at `start()` from the configuration collected by
//! the façade: the frame list, the frame length `F` (in time units), the
//! unit time `U`, and the declared WCETs.  After freezing it is shared
//! read-only with the executive thread, so no locking is needed on the
//! dispatch path.

use std::time::Duration;

/// Wall-clock duration of one quantum when the caller does not override it.
pub const DEFAULT_UNIT_MS: u64 = 10;

/// The frozen cyclic schedule: what to release, when, for how long.
#[derive(Debug, Clone)]
pub struct Schedule {
    frames: Vec<Vec<usize>>,
    frame_length: u32,
    unit: Duration,
    wcets: Vec<u32>,
}

impl Schedule {
    pub(crate) fn new(
        frames: Vec<Vec<usize>>,
        frame_length: u32,
        unit: Duration,
        wcets: Vec<u32>,
    ) -> Schedule {
        Schedule {
            frames,
            frame_length,
            unit,
            wcets,
        }
    }

    /// Number of frames in one rotation (the minor-cycle count).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Ordered task ids of frame `frame_id`.
    pub fn frame(&self, frame_id: usize) -> &[usize] {
        &self.frames[frame_id]
    }

    /// Frame length `F`, in time units.
    pub fn frame_length(&self) -> u32 {
        self.frame_length
    }

    /// Unit time `U`.
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Wall-clock duration of one frame: `F · U`.
    pub fn frame_duration(&self) -> Duration {
        self.unit * self.frame_length
    }

    /// Number of slots in the task table.
    pub fn num_tasks(&self) -> usize {
        self.wcets.len()
    }

    /// Declared WCET of task `id`, in time units.
    pub fn wcet(&self, id: usize) -> u32 {
        self.wcets[id]
    }

    /// Idle budget of frame `frame_id`: `F − Σ wcet` over the frame's tasks.
    /// Negative when the frame is overcommitted.
    pub fn slack(&self, frame_id: usize) -> i64 {
        let committed: i64 = self.frames[frame_id]
            .iter()
            .map(|&id| i64::from(self.wcets[id]))
            .sum();
        i64::from(self.frame_length) - committed
    }

    /// Frames whose declared WCETs exceed the frame length.  Surfaced as a
    /// warning at `start()`; the schedule still runs.
    pub fn overcommitted_frames(&self) -> Vec<usize> {
        (0..self.frames.len())
            .filter(|&frame_id| self.slack(frame_id) < 0)
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(frames: Vec<Vec<usize>>, frame_length: u32, wcets: Vec<u32>) -> Schedule {
        Schedule::new(frames, frame_length, Duration::from_millis(10), wcets)
    }

    #[test]
    fn frame_duration_is_length_times_unit() {
        let s = schedule(vec![vec![0]], 5, vec![1]);
        assert_eq!(s.frame_duration(), Duration::from_millis(50));
    }

    #[test]
    fn slack_is_frame_length_minus_committed_wcet() {
        // F = 5, frame holds wcets 2 + 1 → slack 2
        let s = schedule(vec![vec![0, 1]], 5, vec![2, 1]);
        assert_eq!(s.slack(0), 2);
    }

    #[test]
    fn slack_goes_negative_when_overcommitted() {
        let s = schedule(vec![vec![0, 1]], 3, vec![2, 2]);
        assert_eq!(s.slack(0), -1);
    }

    #[test]
    fn empty_frame_has_full_slack() {
        let s = schedule(vec![vec![]], 4, vec![1]);
        assert_eq!(s.slack(0), 4);
    }

    #[test]
    fn repeated_task_counts_its_wcet_each_time() {
        let s = schedule(vec![vec![0, 0]], 5, vec![2]);
        assert_eq!(s.slack(0), 1);
    }

    #[test]
    fn overcommitted_frames_lists_only_offenders() {
        let s = schedule(vec![vec![0], vec![0, 1], vec![1]], 2, vec![1, 3]);
        assert_eq!(s.overcommitted_frames(), vec![1, 2]);
    }

    #[test]
    fn accessors_expose_the_frozen_configuration() {
        let s = schedule(vec![vec![0], vec![1, 0]], 4, vec![1, 2]);
        assert_eq!(s.frame_count(), 2);
        assert_eq!(s.frame(1), &[1, 0]);
        assert_eq!(s.frame_length(), 4);
        assert_eq!(s.unit(), Duration::from_millis(10));
        assert_eq!(s.num_tasks(), 2);
        assert_eq!(s.wcet(1), 2);
    }
}
