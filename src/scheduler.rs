//! Cycle scheduler.
//!
//! Runs [`Pipeline::run_cycle`] forever with a fixed pause after every
//! cycle. The pause goes through a [`Sleeper`] so tests can observe it
//! without waiting. Both the cycle and the pause race a [`CancellationToken`]
//! so the binary stops on Ctrl-C even while a request is hanging.

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Something that can wait.
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
pub struct Scheduler<S> {
    interval: Duration,
    sleeper: S,
    shutdown: CancellationToken,
}

impl<S: Sleeper> Scheduler<S> {
    pub fn new(interval: Duration, sleeper: S, shutdown: CancellationToken) -> Self {
        Self {
            interval,
            sleeper,
            shutdown,
        }
    }

    /// Run cycles until cancelled and return how many completed.
    ///
    /// The pause after a cycle is unconditional: it happens whatever the
    /// individual topics did. Cancellation drops a running cycle at its next
    /// await point; a cancelled cycle is not counted.
    ///
    /// # Errors
    ///
    /// A cycle-fatal error (trend feed failure) ends the loop immediately.
    #[instrument(level = "info", skip_all, fields(interval_secs = self.interval.as_secs()))]
    pub async fn run(&self, pipeline: &Pipeline) -> Result<usize, PipelineError> {
        let mut cycles = 0usize;
        while !self.shutdown.is_cancelled() {
            let report = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                report = pipeline.run_cycle() => report?,
            };
            cycles += 1;
            info!(cycle = cycles, %report, "Sleeping until next cycle");

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.sleeper.sleep(self.interval) => {}
            }
        }
        info!(cycles, "Scheduler stopped");
        Ok(cycles)
    }
}
