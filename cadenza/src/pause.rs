/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Busy waiting on the monotonic clock.
//!
//! Task bodies in a cyclic schedule are often modelled as pure CPU
//! consumption; spinning against `Instant` burns exactly the requested
//! wall-clock time without ever blocking, which is what the demos and the
//! scenario tests need.  Never call this from the executive thread.

use std::time::{Duration, Instant};

/// Spin until `duration` has elapsed on the monotonic clock.
pub fn busy_wait(duration: Duration) {
    let stop = Instant::now() + duration;
    while Instant::now() < stop {
        std::hint::spin_loop();
    }
}

/// Spin for `millis` milliseconds.
pub fn busy_wait_ms(millis: u64) {
    busy_wait(Duration::from_millis(millis));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_wait_burns_at_least_the_requested_time() {
        let begun = Instant::now();
        busy_wait_ms(5);
        assert!(begun.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn zero_duration_returns_immediately() {
        let begun = Instant::now();
        busy_wait(Duration::ZERO);
        assert!(begun.elapsed() < Duration::from_millis(50));
    }
}
