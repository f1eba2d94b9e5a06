/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Linux backend: `pthread_setschedparam` / `pthread_setaffinity_np`.
//!
//! Band mapping: domain value `v > 0` becomes raw FIFO priority
//! `sched_min + v − 1`; the domain zero becomes `SCHED_OTHER` with a zeroed
//! `sched_param`.

use std::mem;
use std::sync::OnceLock;
use std::thread::JoinHandle;

use super::RtError;

pub(super) type RawThread = libc::pthread_t;

pub(super) fn current() -> RawThread {
    unsafe { libc::pthread_self() }
}

pub(super) fn of<T>(handle: &JoinHandle<T>) -> RawThread {
    use std::os::unix::thread::JoinHandleExt;
    handle.as_pthread_t()
}

/// Width of the FIFO band reported by the OS, cached for the process
/// lifetime (the kernel never changes it at run time).
pub(super) fn fifo_span() -> u32 {
    static SPAN: OnceLock<u32> = OnceLock::new();
    *SPAN.get_or_init(|| {
        let max = unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) };
        let min = unsafe { libc::sched_get_priority_min(libc::SCHED_FIFO) };
        if max <= 0 || min < 0 || max < min {
            1
        } else {
            (max - min + 1) as u32
        }
    })
}

fn check(res: libc::c_int) -> Result<(), RtError> {
    match res {
        0 => Ok(()),
        libc::EPERM => Err(RtError::PermissionDenied),
        errno => Err(RtError::Os(std::io::Error::from_raw_os_error(errno))),
    }
}

pub(super) fn set_priority(thread: RawThread, value: u32) -> Result<(), RtError> {
    let mut param: libc::sched_param = unsafe { mem::zeroed() };
    if value == 0 {
        check(unsafe { libc::pthread_setschedparam(thread, libc::SCHED_OTHER, &param) })
    } else {
        let min = unsafe { libc::sched_get_priority_min(libc::SCHED_FIFO) };
        param.sched_priority = min + value as libc::c_int - 1;
        check(unsafe { libc::pthread_setschedparam(thread, libc::SCHED_FIFO, &param) })
    }
}

pub(super) fn get_priority(thread: RawThread) -> Result<u32, RtError> {
    let mut policy: libc::c_int = 0;
    let mut param: libc::sched_param = unsafe { mem::zeroed() };
    check(unsafe { libc::pthread_getschedparam(thread, &mut policy, &mut param) })?;

    if policy == libc::SCHED_FIFO {
        let min = unsafe { libc::sched_get_priority_min(libc::SCHED_FIFO) };
        Ok((param.sched_priority - min + 1).max(0) as u32)
    } else {
        Ok(0)
    }
}

pub(super) fn set_affinity(thread: RawThread, mask: u64) -> Result<(), RtError> {
    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut set);
    }
    for cpu in 0..64 {
        if mask >> cpu & 1 == 1 {
            unsafe {
                libc::CPU_SET(cpu as usize, &mut set);
            }
        }
    }
    check(unsafe { libc::pthread_setaffinity_np(thread, mem::size_of::<libc::cpu_set_t>(), &set) })
}

pub(super) fn get_affinity(thread: RawThread) -> Result<u64, RtError> {
    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    check(unsafe {
        libc::pthread_getaffinity_np(thread, mem::size_of::<libc::cpu_set_t>(), &mut set)
    })?;

    let mut mask = 0u64;
    for cpu in 0..64 {
        if unsafe { libc::CPU_ISSET(cpu as usize, &set) } {
            mask |= 1 << cpu;
        }
    }
    Ok(mask)
}
