/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-task state machine and worker loop.
//!
//! Each declared task owns one [`TaskControl`]: a mutex-guarded state word
//! plus the two condition variables of the executive/worker handshake.  The
//! pair of threads shares it through an `Arc`:
//!
//! ```text
//!            cv_release                    cv_done
//! executive ───────────▶ worker   worker ──────────▶ (audit / tests)
//!            IDLE→READY            RUNNING→DONE
//! ```
//!
//! # State machine
//!
//! ```text
//! IDLE ──release──▶ READY ──worker wake──▶ RUNNING ──worker end──▶ DONE
//!  ▲                  │                        │                    │
//!  │                  └──exec deadline force──▶│                    │
//!  └──────────── next frame release (DONE→READY) ───────────────────┘
//! ```
//!
//! Only the executive performs `*→READY` and the deadline-miss force to
//! `DONE`; only the worker performs `READY→RUNNING` and `RUNNING→DONE`.
//! The worker's completion transition is conditional on still being in
//! `RUNNING`, which makes a late completion after a forced `DONE` (or after
//! an immediate re-release to `READY`) a harmless no-op plus a redundant
//! `cv_done` signal.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::stats::ExecStats;

// ── State ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of one task instance within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Ready,
    Running,
    Done,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Idle => "IDLE",
            TaskState::Ready => "READY",
            TaskState::Running => "RUNNING",
            TaskState::Done => "DONE",
        };
        f.write_str(s)
    }
}

// ── Label ─────────────────────────────────────────────────────────────────────

/// Identity of a task in diagnostic output: `Task <id>` or `Aperiodic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskLabel {
    Periodic(usize),
    Aperiodic,
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskLabel::Periodic(id) => write!(f, "Task {id}"),
            TaskLabel::Aperiodic => f.write_str("Aperiodic"),
        }
    }
}

// ── Synchronisation unit ──────────────────────────────────────────────────────

/// Everything guarded by one task's mutex.
#[derive(Debug)]
pub(crate) struct TaskFlags {
    pub(crate) state: TaskState,
    /// Aperiodic request flag; armed by `ap_task_request`, consumed by the
    /// executive at frame start.  Never set on periodic descriptors.
    pub(crate) pending: bool,
    /// Cooperative exit flag; raised once during `wait()`.
    pub(crate) shutdown: bool,
}

/// One task's indivisible sync unit: mutex + state + the two condvars.
///
/// The mutex guards exactly this task's flags; it is never held across the
/// user function, and the executive never holds more than one at a time.
#[derive(Debug)]
pub(crate) struct TaskControl {
    flags: Mutex<TaskFlags>,
    pub(crate) cv_release: Condvar,
    pub(crate) cv_done: Condvar,
}

impl TaskControl {
    pub(crate) fn new() -> TaskControl {
        TaskControl {
            flags: Mutex::new(TaskFlags {
                state: TaskState::Idle,
                pending: false,
                shutdown: false,
            }),
            cv_release: Condvar::new(),
            cv_done: Condvar::new(),
        }
    }

    /// Lock the flags, recovering from poisoning.  The user function runs
    /// with no lock held and worker panics are contained, so a poisoned
    /// mutex can only mean a panic in dispatch code itself; the flags stay
    /// coherent either way.
    pub(crate) fn lock(&self) -> MutexGuard<'_, TaskFlags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block on `cv_release` until re-notified.
    pub(crate) fn wait_release<'a>(
        &self,
        guard: MutexGuard<'a, TaskFlags>,
    ) -> MutexGuard<'a, TaskFlags> {
        self.cv_release
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Arm the aperiodic request flag, coalescing repeated calls.
///
/// The flag is only armed while the previous instance is inactive
/// (`IDLE`/`DONE`); a request arriving while the aperiodic is `READY` or
/// `RUNNING` coalesces with that live instance and is dropped silently.
pub(crate) fn arm_aperiodic(control: &TaskControl) {
    let mut flags = control.lock();
    if matches!(flags.state, TaskState::Idle | TaskState::Done) {
        flags.pending = true;
    }
}

// ── Worker loop ───────────────────────────────────────────────────────────────

/// Body of one worker thread, looping until shutdown:
///
/// 1. wait on `cv_release` until `READY` (or shutdown);
/// 2. flip to `RUNNING` and drop the lock;
/// 3. run the user function with no lock held;
/// 4. relock, complete `RUNNING→DONE` if not forced meanwhile, signal
///    `cv_done`.
///
/// A panicking user function is contained here: it is reported, counted,
/// and the invocation is treated as completed, so one crashing release
/// cannot take the executive down.
pub(crate) fn worker_loop(
    control: Arc<TaskControl>,
    mut function: Box<dyn FnMut() + Send>,
    label: TaskLabel,
    stats: Arc<ExecStats>,
) {
    loop {
        {
            let mut flags = control.lock();
            while flags.state != TaskState::Ready && !flags.shutdown {
                flags = control.wait_release(flags);
            }
            if flags.shutdown {
                return;
            }
            flags.state = TaskState::Running;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| function()));

        let mut flags = control.lock();
        if outcome.is_err() {
            eprintln!("[ERROR] {label} panicked during execution");
            stats.record_task_panic();
        }
        if flags.state == TaskState::Running {
            flags.state = TaskState::Done;
        }
        control.cv_done.notify_one();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
