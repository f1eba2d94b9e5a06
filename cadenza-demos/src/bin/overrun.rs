/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deliberate deadline overrun.
//!
//! Five tasks on 400 ms frames (frame length 4, unit 100 ms).  Task 3
//! burns more CPU than a whole frame, so every frame that schedules it
//! emits `[DEADLINE MISS] Task 3`, demotes the worker, and the rotation
//! keeps turning — the recovery path this executive is built around.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use cadenza::pause::busy_wait_ms;
use cadenza::Executive;

#[derive(Parser)]
#[command(about = "Deadline-miss demo: one task overruns its frame every time")]
struct Args {
    /// Unit time in milliseconds.
    #[arg(long, default_value_t = 100)]
    unit_ms: u64,

    /// Stop after this many seconds; 0 runs forever.
    #[arg(long, default_value_t = 6)]
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

    let mut exec = Executive::with_unit(5, 4, args.unit_ms)?;
    exec.set_periodic_task(0, || busy_wait_ms(90), 1)?;
    exec.set_periodic_task(1, || busy_wait_ms(185), 2)?;
    exec.set_periodic_task(2, || busy_wait_ms(88), 1)?;
    // Declared at 3 units but actually needs more than the whole frame.
    exec.set_periodic_task(3, || busy_wait_ms(450), 3)?;
    exec.set_periodic_task(4, || busy_wait_ms(80), 1)?;

    exec.add_frame(vec![0, 1, 2])?;
    exec.add_frame(vec![0, 3])?;
    exec.add_frame(vec![0, 1])?;
    exec.add_frame(vec![0, 1])?;
    exec.add_frame(vec![0, 1, 4])?;

    exec.start()?;
    if args.seconds > 0 {
        std::thread::sleep(Duration::from_secs(args.seconds));
        exec.stop();
    }
    exec.wait();

    println!("{:?}", exec.stats());
    Ok(())
}
