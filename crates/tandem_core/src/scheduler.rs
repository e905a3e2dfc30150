//! Dual-cadence frame planning
//!
//! [`FrameScheduler`] turns "what time is it now" into a [`FramePlan`]: how
//! many fixed simulation steps to run this iteration and whether to render.
//! The two cadences are independent. Fixed steps use an accumulator so
//! simulated time tracks wall time, clamped to `max_fixed_steps` per
//! iteration; time beyond the clamp is dropped rather than owed.

use std::time::Duration;

use crate::time::{SimulationTime, TICK_DURATION};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Simulated time per fixed step.
    pub fixed_interval: Duration,
    /// Minimum time between rendered frames. Zero renders every iteration.
    pub render_interval: Duration,
    /// Most fixed steps run in one iteration before the backlog is dropped.
    pub max_fixed_steps: u32,
    /// Time allowed per frame for draining background uploads.
    pub upload_budget: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_interval: TICK_DURATION,
            render_interval: Duration::ZERO,
            max_fixed_steps: 5,
            upload_budget: Duration::from_millis(2),
        }
    }
}

/// What one loop iteration should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramePlan {
    pub fixed_steps: u32,
    /// Steps owed beyond the clamp and discarded.
    pub dropped_steps: u32,
    /// Variable delta since the previous render, if this iteration renders.
    pub render_delta: Option<Duration>,
}

pub struct FrameScheduler {
    config: SchedulerConfig,
    started: bool,
    last_tick: Duration,
    last_render: Duration,
    accumulator: Duration,
    sim_time: SimulationTime,
}

impl FrameScheduler {
    pub fn new(mut config: SchedulerConfig) -> Self {
        if config.fixed_interval.is_zero() {
            tracing::warn!(
                fallback = ?TICK_DURATION,
                "fixed interval of zero would spin forever, using default"
            );
            config.fixed_interval = TICK_DURATION;
        }
        if config.max_fixed_steps == 0 {
            tracing::warn!("max_fixed_steps of zero would never step, clamping to 1");
            config.max_fixed_steps = 1;
        }
        Self {
            config,
            started: false,
            last_tick: Duration::ZERO,
            last_render: Duration::ZERO,
            accumulator: Duration::ZERO,
            sim_time: SimulationTime::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The fixed delta handed to fixed-cadence callbacks, in seconds.
    pub fn fixed_delta(&self) -> f32 {
        self.config.fixed_interval.as_secs_f32()
    }

    /// Plan the iteration happening at `now`.
    ///
    /// `now` is time since an arbitrary origin and should not go backwards;
    /// if it does, the iteration sees zero elapsed time and the interval
    /// already counted is not counted again.
    pub fn plan(&mut self, now: Duration) -> FramePlan {
        if !self.started {
            self.started = true;
            self.last_tick = now;
            self.last_render = now;
        }

        let elapsed = now.saturating_sub(self.last_tick);
        self.last_tick = self.last_tick.max(now);
        self.accumulator += elapsed;

        let fixed = self.config.fixed_interval;
        let mut plan = FramePlan::default();
        while self.accumulator >= fixed && plan.fixed_steps < self.config.max_fixed_steps {
            self.accumulator -= fixed;
            self.sim_time.advance(fixed);
            plan.fixed_steps += 1;
        }
        if self.accumulator >= fixed {
            let owed = self.accumulator.as_nanos() / fixed.as_nanos();
            plan.dropped_steps = u32::try_from(owed).unwrap_or(u32::MAX);
            let remainder = self.accumulator.as_nanos() % fixed.as_nanos();
            self.accumulator = Duration::from_nanos(u64::try_from(remainder).unwrap_or(0));
        }

        let since_render = now.saturating_sub(self.last_render);
        if since_render >= self.config.render_interval {
            self.last_render = self.last_render.max(now);
            plan.render_delta = Some(since_render);
        }
        plan
    }

    /// How far into the next fixed step the accumulator is, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.config.fixed_interval.as_secs_f32()
    }

    pub fn sim_time(&self) -> &SimulationTime {
        &self.sim_time
    }
}
