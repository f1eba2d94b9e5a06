/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Thin capability layer over POSIX fixed-priority scheduling and CPU
//! affinity.
//!
//! [`Priority`] models the `SCHED_FIFO` band as a totally ordered domain
//! with three named members:
//!
//! ```text
//! not_rt        rt_min                        rt_max
//!   0     <       1       <  2  <  ...  <     span
//!   └ SCHED_OTHER ┴──────────── SCHED_FIFO ──────┘
//! ```
//!
//! A priority is "real-time" iff it lies in `[rt_min, rt_max]`; the zero
//! value maps back to the default fair scheduling class.  Arithmetic
//! saturates at both ends of the band, so `rt_max() + 1 == rt_max()` and
//! `not_rt() - 1 == not_rt()`.
//!
//! # Platform backends
//! On Linux the layer binds `pthread_setschedparam` /
//! `pthread_setaffinity_np` through `libc`.  Elsewhere a fallback backend
//! refuses RT-band entry with [`RtError::Unsupported`], accepts affinity
//! changes as no-ops, and reports non-RT priority and full affinity, so
//! callers keep running with degraded timing guarantees instead of failing.
//!
//! # Failure contract
//! Entering the RT band from an unprivileged process fails with
//! [`RtError::PermissionDenied`]; on a platform without fixed-priority
//! scheduling control the same request fails with
//! [`RtError::Unsupported`].  Callers in the dispatch path are expected to
//! log and continue; the executive still functions, only without its
//! ordering guarantees.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::thread::JoinHandle;

use thiserror::Error;

#[cfg(target_os = "linux")]
#[path = "sys.rs"]
mod sys;
#[cfg(not(target_os = "linux"))]
#[path = "sys_stub.rs"]
mod sys;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures surfaced by the capability layer.
#[derive(Debug, Error)]
pub enum RtError {
    /// The OS refused the scheduling change (typically an unprivileged
    /// process asking for `SCHED_FIFO`).
    #[error("permission denied entering the real-time scheduling band")]
    PermissionDenied,

    /// The platform backend has no fixed-priority scheduling control at
    /// all (non-Linux builds).  Callers degrade exactly as for a
    /// permission failure; the distinct variant keeps "this platform
    /// cannot" tellable apart from "this process may not".
    #[error("real-time scheduling is not supported on this platform")]
    Unsupported,

    /// Any other scheduler syscall failure, carrying the OS errno.
    #[error("scheduler call failed: {0}")]
    Os(#[from] std::io::Error),
}

// ── Priority ──────────────────────────────────────────────────────────────────

/// A scheduling priority in the totally ordered domain
/// `not_rt < rt_min <= ... <= rt_max`.
///
/// Internally `0` is the non-RT member and `1..=span` maps onto the OS
/// `SCHED_FIFO` range (`span = sched_max − sched_min + 1`).  The mapping to
/// raw OS values happens only inside the platform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u32);

impl Priority {
    /// The default (fair-class) priority; every thread starts here.
    pub const fn not_rt() -> Priority {
        Priority(0)
    }

    /// Lowest member of the RT band.
    pub const fn rt_min() -> Priority {
        Priority(1)
    }

    /// Highest member of the RT band, as reported by the OS.
    pub fn rt_max() -> Priority {
        Priority(sys::fifo_span())
    }

    /// `true` iff this priority lies in `[rt_min, rt_max]`.
    pub fn is_rt(self) -> bool {
        self.0 > 0
    }
}

impl Add<u32> for Priority {
    type Output = Priority;

    fn add(self, n: u32) -> Priority {
        Priority(self.0.saturating_add(n).min(sys::fifo_span()))
    }
}

impl Sub<u32> for Priority {
    type Output = Priority;

    fn sub(self, n: u32) -> Priority {
        Priority(self.0.saturating_sub(n))
    }
}

impl AddAssign<u32> for Priority {
    fn add_assign(&mut self, n: u32) {
        *self = *self + n;
    }
}

impl SubAssign<u32> for Priority {
    fn sub_assign(&mut self, n: u32) {
        *self = *self - n;
    }
}

/// Signed distance between two priorities, in band steps.
impl Sub for Priority {
    type Output = i64;

    fn sub(self, rhs: Priority) -> i64 {
        i64::from(self.0) - i64::from(rhs.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Affinity ──────────────────────────────────────────────────────────────────

/// CPU affinity expressed as a bitmask: bit N set means CPU N is allowed.
///
/// `single(0)` pins execution to CPU 0 deterministically, which is how the
/// executive serialises its workers on one core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AffinityMask(u64);

impl AffinityMask {
    /// No CPU allowed.  Only useful as a builder starting point.
    pub const fn empty() -> AffinityMask {
        AffinityMask(0)
    }

    /// Every CPU allowed.
    pub const fn all() -> AffinityMask {
        AffinityMask(u64::MAX)
    }

    /// Exactly one CPU allowed.  `cpu` must be `< 64`.
    pub const fn single(cpu: u32) -> AffinityMask {
        assert!(cpu < 64);
        AffinityMask(1 << cpu)
    }

    /// This mask with `cpu` additionally allowed.  `cpu` must be `< 64`.
    pub const fn with(self, cpu: u32) -> AffinityMask {
        assert!(cpu < 64);
        AffinityMask(self.0 | 1 << cpu)
    }

    /// `true` iff `cpu` is allowed by this mask.
    pub const fn contains(self, cpu: u32) -> bool {
        cpu < 64 && (self.0 >> cpu) & 1 == 1
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bitmask form.
    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn from_bits(bits: u64) -> AffinityMask {
        AffinityMask(bits)
    }

    /// Allowed CPU ids, ascending.
    pub fn cpus(self) -> impl Iterator<Item = u32> {
        (0..64).filter(move |&cpu| self.contains(cpu))
    }
}

// ── Thread handle ─────────────────────────────────────────────────────────────

/// A copyable reference to an OS thread, valid until that thread is joined.
///
/// Obtained either from the calling thread ([`RtThread::current`]) or from a
/// [`JoinHandle`] ([`RtThread::of`]).  It exists so the executive thread can
/// retarget worker priorities without owning the workers' join handles.
#[derive(Debug, Clone, Copy)]
pub struct RtThread(sys::RawThread);

impl RtThread {
    /// The calling thread.
    pub fn current() -> RtThread {
        RtThread(sys::current())
    }

    /// The thread behind `handle`.
    pub fn of<T>(handle: &JoinHandle<T>) -> RtThread {
        RtThread(sys::of(handle))
    }
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Move `thread` to priority `p` (`SCHED_FIFO` inside the band,
/// `SCHED_OTHER` for [`Priority::not_rt`]).
pub fn set_priority(thread: RtThread, p: Priority) -> Result<(), RtError> {
    sys::set_priority(thread.0, p.0)
}

/// Current priority of `thread`.  Threads outside `SCHED_FIFO` report
/// [`Priority::not_rt`].
pub fn get_priority(thread: RtThread) -> Result<Priority, RtError> {
    sys::get_priority(thread.0).map(Priority)
}

/// Restrict `thread` to the CPUs in `mask`.
pub fn set_affinity(thread: RtThread, mask: AffinityMask) -> Result<(), RtError> {
    sys::set_affinity(thread.0, mask.bits())
}

/// Current affinity of `thread`.
pub fn get_affinity(thread: RtThread) -> Result<AffinityMask, RtError> {
    sys::get_affinity(thread.0).map(AffinityMask)
}

/// Convenience wrappers targeting the calling thread.
pub mod this_thread {
    use super::{AffinityMask, Priority, RtError, RtThread};

    pub fn set_priority(p: Priority) -> Result<(), RtError> {
        super::set_priority(RtThread::current(), p)
    }

    pub fn get_priority() -> Result<Priority, RtError> {
        super::get_priority(RtThread::current())
    }

    pub fn set_affinity(mask: AffinityMask) -> Result<(), RtError> {
        super::set_affinity(RtThread::current(), mask)
    }

    pub fn get_affinity() -> Result<AffinityMask, RtError> {
        super::get_affinity(RtThread::current())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
