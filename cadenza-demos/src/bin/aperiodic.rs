/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Aperiodic service through a periodic trigger.
//!
//! The rotation of six periodic tasks runs on 50 ms frames; every fifth
//! activation of task 4 requests the aperiodic task, which then runs in the
//! following frame's slack.  The request sits in the middle of task 4's own
//! busy time, exercising the requirement that `ap_task_request` is callable
//! from inside a running task function.
//!
//! The 42 ms aperiodic does not always fit the slack left by the next
//! frame, so an occasional `[DEADLINE MISS] Aperiodic` line is part of the
//! demonstration: the worker is demoted, finishes late, and is ready again
//! for the next request.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cadenza::pause::busy_wait_ms;
use cadenza::Executive;

#[derive(Parser)]
#[command(about = "Aperiodic-task demo: a periodic task triggers on-demand work")]
struct Args {
    /// Stop after this many seconds; 0 runs forever.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut exec = Executive::new(6, 5)?;
    exec.set_aperiodic_task(
        || {
            info!("aperiodic released");
            busy_wait_ms(42);
            info!("aperiodic finished");
        },
        5,
    )?;

    exec.set_periodic_task(0, || busy_wait_ms(15), 2)?;
    exec.set_periodic_task(1, || busy_wait_ms(6), 1)?;
    exec.set_periodic_task(2, || busy_wait_ms(18), 2)?;
    exec.set_periodic_task(3, || busy_wait_ms(17), 2)?;

    let requester = exec
        .ap_requester()
        .context("aperiodic task must be declared before a handle is taken")?;
    let mut activations = 0u32;
    exec.set_periodic_task(
        4,
        move || {
            activations += 1;
            if activations % 5 == 0 {
                busy_wait_ms(5);
                requester.request();
                busy_wait_ms(7);
            } else {
                busy_wait_ms(28);
            }
        },
        3,
    )?;
    exec.set_periodic_task(5, || busy_wait_ms(8), 1)?;

    exec.add_frame(vec![0, 1, 2])?;
    exec.add_frame(vec![3, 4])?;
    exec.add_frame(vec![0, 3])?;
    exec.add_frame(vec![1, 4, 5])?;
    exec.add_frame(vec![0, 2])?;
    exec.add_frame(vec![1, 5, 2])?;

    exec.start()?;
    if args.seconds > 0 {
        std::thread::sleep(Duration::from_secs(args.seconds));
        exec.stop();
    }
    exec.wait();

    println!("{:?}", exec.stats());
    Ok(())
}
