//! Supervisor loop - repeats processing cycles until a stop is requested.
//!
//! The cycle boundary is the last line of defense: a failed cycle is logged
//! and the loop continues after a short backoff. Shutdown is cooperative -
//! the stop flag is observed before each cycle and after the inter-cycle
//! sleep completes, never mid-call. No in-flight lead is left half-processed
//! because the orchestrator finishes each lead's write-back before yielding.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::pipeline::cycle::LeadProcessor;

/// Observable state of the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Terminal: the loop exits at its next suspension-point check.
    Stopping,
}

/// Shared run-state handle - the only thing signal handlers touch.
///
/// Handlers set the flag; the loop queries it at its own suspension points.
/// Nothing outside the supervisor reaches into orchestrator internals.
#[derive(Debug, Default)]
pub struct RunState {
    stopping: AtomicBool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop. Idempotent; logs on the first transition.
    pub fn request_stop(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            info!("Stop requested, supervisor will exit after the current pause");
        }
    }

    pub fn state(&self) -> LoopState {
        if self.stopping.load(Ordering::SeqCst) {
            LoopState::Stopping
        } else {
            LoopState::Running
        }
    }

    fn is_stopping(&self) -> bool {
        self.state() == LoopState::Stopping
    }
}

/// Runs processing cycles on a fixed interval until stopped.
pub struct Supervisor {
    processor: Arc<LeadProcessor>,
    /// Pause between successful cycles.
    interval: Duration,
    /// Pause after a failed cycle, instead of the normal interval.
    error_backoff: Duration,
    run_state: Arc<RunState>,
}

impl Supervisor {
    pub fn new(processor: Arc<LeadProcessor>, interval: Duration, error_backoff: Duration) -> Self {
        Self {
            processor,
            interval,
            error_backoff,
            run_state: Arc::new(RunState::new()),
        }
    }

    /// Handle for requesting a stop from signal handlers.
    pub fn run_state(&self) -> Arc<RunState> {
        Arc::clone(&self.run_state)
    }

    /// Run until a stop is requested.
    ///
    /// Each iteration: check the flag, run one cycle, sleep. A stop arriving
    /// during the sleep takes effect right after it, before any new cycle.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Lead supervisor started"
        );

        let mut cycle_count: u64 = 0;
        while !self.run_state.is_stopping() {
            cycle_count += 1;
            debug!(cycle = cycle_count, "Starting cycle");

            let pause = match self.processor.run_cycle().await {
                Ok(_) => self.interval,
                Err(e) => {
                    error!(cycle = cycle_count, error = %e, "Cycle failed");
                    self.error_backoff
                }
            };

            tokio::time::sleep(pause).await;
        }

        info!(cycles = cycle_count, "Lead supervisor stopped");
    }
}
