/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the lifecycle façade.
//!
//! Every variant is a synchronously detected misconfiguration: the schedule
//! is either malformed or being mutated after it was frozen by `start()`.
//! Run-time degradations (deadline misses, refused priority changes) are
//! deliberately *not* errors — they are reported on the diagnostic streams
//! and the executive keeps running, as the failure-semantics table of the
//! design requires.

use thiserror::Error;

/// Configuration failures surfaced by the [`Executive`](super::Executive)
/// façade.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A frame or task operation referenced an id outside the task table.
    #[error("task id {id} is out of range (task table holds {num_tasks})")]
    TaskIdOutOfRange { id: usize, num_tasks: usize },

    /// `start()` found a periodic slot with no function assigned.
    #[error("periodic task {id} has no function assigned")]
    FunctionMissing { id: usize },

    /// The aperiodic slot was declared (e.g. by a schedule description)
    /// but never given a function.
    #[error("the aperiodic task has no function assigned")]
    AperiodicFunctionMissing,

    /// A function was offered for the aperiodic slot before the slot was
    /// declared.
    #[error("no aperiodic task is declared in this schedule")]
    AperiodicNotDeclared,

    /// Configuration was attempted after `start()` froze the schedule.
    #[error("the schedule is frozen once start() has run")]
    AlreadyStarted,

    /// `start()` was called with no frames configured.
    #[error("the frame list is empty")]
    NoFrames,

    /// Frame length must be a positive number of time units.
    #[error("frame length must be positive")]
    ZeroFrameLength,

    /// Unit time must be a positive number of milliseconds.
    #[error("unit time must be positive")]
    ZeroUnitTime,

    /// The OS refused to spawn a worker or the executive thread.
    #[error("failed to spawn a scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}
