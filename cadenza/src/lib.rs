/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cadenza – a cyclic-executive real-time scheduler.
//!
//! A user statically describes a rotation of *frames* (each an ordered list
//! of task ids), assigns per-task worst-case execution times, and starts
//! the executive; the executive then releases tasks at frame boundaries on
//! an absolute monotonic-clock grid, enforces one-frame deadlines, and
//! reports overruns.  All threads are pinned to one core and serialised by
//! the OS fixed-priority scheduler.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── rt/          – POSIX priority & affinity capability layer
//! ├── task         – per-task state machine and worker loop
//! ├── schedule     – immutable frame/WCET store, slack analysis
//! ├── executive/   – dispatch loop and lifecycle façade
//! ├── config/      – YAML schedule descriptions
//! ├── stats        – lock-free dispatch counters
//! └── pause        – busy-wait utility for demos and tests
//! ```

pub mod config;
pub mod executive;
pub mod pause;
pub mod rt;
pub mod schedule;
mod stats;
mod task;

pub use config::ScheduleSpec;
pub use executive::{ApRequester, ConfigError, Executive};
pub use schedule::{Schedule, DEFAULT_UNIT_MS};
pub use stats::StatsSnapshot;
pub use task::TaskState;
