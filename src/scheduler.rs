//! Fixed-interval poll loop.
//!
//! Runs one cycle per period, forever. Cycles never overlap: the next tick
//! is awaited only after the previous cycle returns. When a cycle overruns
//! the period, the missed tick fires once immediately and the schedule
//! shifts; missed ticks are never queued up as a backlog.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    pub fn new(period_secs: u64) -> Self {
        Self {
            period: Duration::from_secs(period_secs),
        }
    }

    /// Run `cycle` once per period. Cycle errors are logged and absorbed;
    /// this loop only ends when the surrounding task is dropped.
    pub async fn run<C, Fut, E>(&self, mut cycle: C)
    where
        C: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        info!(period_secs = self.period.as_secs(), "scheduler started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick; the first cycle runs one full
        // period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if let Err(e) = cycle().await {
                error!(error = %e, "poll cycle failed; retrying on next tick");
            }
        }
    }
}
