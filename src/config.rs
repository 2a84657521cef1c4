use std::time::Duration;

use crate::limit::{Travel, FULLY_OPEN};

/// Default interval between two ticks of the simulated motor.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Capacity of the per-subscription queue between the worker and its relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backlog {
    /// Every value is kept until it is delivered or the curtain shuts down.
    #[default]
    Unbounded,
    /// At most `n` values wait for delivery; the oldest are overwritten, so
    /// the latest value is never lost.
    Bounded(usize),
}

/// Settings for a [`SimulatedCurtain`](crate::SimulatedCurtain).
///
/// `initial_position` goes through `travel` the same way targets do.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tick: Duration,
    pub initial_position: i32,
    pub travel: Travel,
    pub backlog: Backlog,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            initial_position: FULLY_OPEN,
            travel: Travel::default(),
            backlog: Backlog::default(),
        }
    }
}

impl SimConfig {
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_initial_position(mut self, at: i32) -> Self {
        self.initial_position = at;
        self
    }

    pub fn with_travel(mut self, travel: Travel) -> Self {
        self.travel = travel;
        self
    }

    pub fn with_backlog(mut self, backlog: Backlog) -> Self {
        self.backlog = backlog;
        self
    }
}
