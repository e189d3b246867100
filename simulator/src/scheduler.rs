//! Timer-driven replay of a decision path.
//!
//! The scheduler owns both the [`AnimationState`] and the only timer. The timer
//! is a `tokio` [`Interval`] stored inline, created on the first wait of a run
//! and dropped by `cancel`, `start`, or run completion. Nothing is spawned, so
//! there is never more than one timer and none can outlive its run.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::core::animation::{AnimationState, Frame, TickOutcome};
use crate::core::graph::PathDefinition;

/// Per-item replay interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(220);

#[derive(Debug)]
pub struct AnimationScheduler {
    state: AnimationState,
    period: Duration,
    started_at: Option<Instant>,
    ticker: Option<Interval>,
    run: u64,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl AnimationScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            state: AnimationState::new(),
            period,
            started_at: None,
            ticker: None,
            run: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Begin replaying `path`, cancelling any run in progress first.
    pub fn start(&mut self, path: &PathDefinition) {
        self.cancel();
        self.run += 1;
        self.state.start(path);
        self.started_at = Some(Instant::now());
        debug!(run = self.run, items = path.len(), "animation started");
    }

    /// Stop the timer and clear `activated`/`current`. Idempotent.
    pub fn cancel(&mut self) {
        let had_timer = self.ticker.take().is_some();
        if had_timer || self.state.is_running() {
            debug!(run = self.run, "animation cancelled");
        }
        self.started_at = None;
        self.state.cancel();
    }

    /// Wait for the next tick of the active run and apply it.
    ///
    /// Returns `None` when no run is active. Cancel-safe: dropping the future
    /// before it resolves leaves the run exactly where it was.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        if !self.state.is_running() {
            self.ticker = None;
            return None;
        }

        let period = self.period;
        let first_tick = self.started_at.unwrap_or_else(Instant::now) + period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;

        match self.state.tick() {
            TickOutcome::Activated(id) => debug!(run = self.run, id = %id, "activate"),
            TickOutcome::Finished => {
                self.ticker = None;
                debug!(run = self.run, "animation finished");
            }
            TickOutcome::Inactive => {}
        }
        Some(self.state.frame())
    }

    /// Drive the active run to its end, handing each frame to `on_frame`.
    pub async fn run_to_completion<F: FnMut(&Frame)>(&mut self, mut on_frame: F) {
        while let Some(frame) = self.next_frame().await {
            on_frame(&frame);
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn frame(&self) -> Frame {
        self.state.frame()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// True while a timer is alive.
    pub fn has_timer(&self) -> bool {
        self.ticker.is_some()
    }

    /// Monotonic counter of started runs.
    pub fn run_id(&self) -> u64 {
        self.run
    }
}
