/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fallback backend for platforms without POSIX scheduling control.
//!
//! Asking for an RT-band priority is refused with `RtError::Unsupported`,
//! so callers can tell the platform gap apart from a permission failure;
//! staying in the fair class and all affinity changes are accepted as
//! no-ops, and every query reports the degraded defaults (fair-class
//! priority, full affinity).  The executive keeps running without its
//! timing guarantees instead of failing outright.

use std::thread::JoinHandle;

use super::RtError;

pub(super) type RawThread = ();

pub(super) fn current() -> RawThread {}

pub(super) fn of<T>(_handle: &JoinHandle<T>) -> RawThread {}

/// Nominal band width matching a typical POSIX FIFO range, so priority
/// arithmetic behaves the same as on Linux.
pub(super) fn fifo_span() -> u32 {
    99
}

pub(super) fn set_priority(_thread: RawThread, value: u32) -> Result<(), RtError> {
    if value == 0 {
        Ok(())
    } else {
        Err(RtError::Unsupported)
    }
}

pub(super) fn get_priority(_thread: RawThread) -> Result<u32, RtError> {
    Ok(0)
}

pub(super) fn set_affinity(_thread: RawThread, _mask: u64) -> Result<(), RtError> {
    Ok(())
}

pub(super) fn get_affinity(_thread: RawThread) -> Result<u64, RtError> {
    Ok(u64::MAX)
}
