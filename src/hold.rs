use crate::analysis::AnalysisResult;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

/// Hold bookkeeping for the selected pose.
///
/// `best_hold_seconds >= current_hold_seconds` always holds, and
/// `hold_started_at_tick` is set exactly when `current_hold_seconds > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoldState {
    pub hold_started_at_tick: Option<u64>,
    pub current_hold_seconds: f64,
    pub best_hold_seconds: f64,
}

/// Turns per-tick correct/incorrect classifications into hold durations.
///
/// A classification at tick `n` covers the interval that ended at tick `n`,
/// so the first correct tick of a run already counts as one full interval
/// and `k` consecutive correct ticks yield `k` intervals of hold.
#[derive(Debug, Clone)]
pub struct HoldTimer {
    state: HoldState,
    tick_seconds: f64,
}

impl HoldTimer {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            state: HoldState::default(),
            tick_seconds: tick_interval.as_secs_f64(),
        }
    }

    /// Apply the classification for tick `now` and return the new state
    pub fn update(&mut self, result: &AnalysisResult, now: u64) -> HoldState {
        if result.is_correct {
            let started = *self
                .state
                .hold_started_at_tick
                .get_or_insert_with(|| now.saturating_sub(1));
            let held_ticks = now.saturating_sub(started).max(1);

            self.state.current_hold_seconds = held_ticks as f64 * self.tick_seconds;
            self.state.best_hold_seconds = self
                .state
                .best_hold_seconds
                .max(self.state.current_hold_seconds);
        } else {
            self.state.hold_started_at_tick = None;
            self.state.current_hold_seconds = 0.0;
        }

        trace!(
            "Hold update at tick {}: current={:.1}s best={:.1}s",
            now,
            self.state.current_hold_seconds,
            self.state.best_hold_seconds
        );

        self.state
    }

    /// Zero all fields; used on session start and pose selection
    pub fn reset(&mut self) {
        self.state = HoldState::default();
    }

    /// End the running hold but keep the best hold for the session summary
    pub fn interrupt(&mut self) {
        self.state.hold_started_at_tick = None;
        self.state.current_hold_seconds = 0.0;
    }

    pub fn state(&self) -> HoldState {
        self.state
    }
}
