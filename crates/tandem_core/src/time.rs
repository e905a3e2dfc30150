//! Simulation time and the clocks that drive the frame loop
//!
//! The loop never reads `Instant` directly: it asks a [`Clock`] for the
//! time since start, so tests can step time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Default fixed simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666);

/// Simulated time advanced one fixed step at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationTime {
    tick_count: u64,
    total: Duration,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance(&mut self, step: Duration) {
        self.tick_count += 1;
        self.total += step;
    }

    pub fn total_time(&self) -> Duration {
        self.total
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Hand-stepped clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_time_counts_ticks() {
        let mut time = SimulationTime::new();
        for _ in 0..3 {
            time.advance(TICK_DURATION);
        }
        assert_eq!(time.tick_count(), 3);
        assert_eq!(time.total_time(), TICK_DURATION * 3);
        time.reset();
        assert_eq!(time.tick_count(), 0);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let view = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(view.now(), Duration::from_millis(5));
    }
}
