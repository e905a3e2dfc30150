//! The application run loop
//!
//! One [`Application`] per thread drives everything: each iteration polls
//! the platform, asks the [`FrameScheduler`] what is due, runs that many
//! fixed steps over the unpaused layers, then (if a frame is due) drains
//! a time-boxed slice of uploads and runs the variable-rate callbacks over
//! every layer.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tandem_metrics::{Counter, FrameTimer};

use crate::layer::{Layer, LayerId, LayerStack};
use crate::platform::{Platform, PlatformStatus};
use crate::scheduler::{FrameScheduler, SchedulerConfig};
use crate::time::{Clock, SystemClock};
use crate::upload::UploadQueue;

thread_local! {
    static APPLICATION_ALIVE: Cell<bool> = const { Cell::new(false) };
}

/// Cloneable handle that asks the loop to stop after the current iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Rc<Cell<bool>>);

impl ShutdownSignal {
    pub fn request(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }
}

/// Snapshot of loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub fixed_steps: u64,
    pub dropped_steps: u64,
    pub uploads_drained: u64,
    pub fps: f64,
    pub frame_time_ms: f64,
}

pub struct Application {
    config: SchedulerConfig,
    layers: LayerStack,
    scheduler: FrameScheduler,
    platform: Box<dyn Platform>,
    clock: Box<dyn Clock>,
    uploads: Arc<UploadQueue>,
    shutdown: ShutdownSignal,
    frame_timer: FrameTimer,
    counters: Counter,
}

impl Application {
    /// Create the application for this thread.
    ///
    /// # Panics
    ///
    /// If another `Application` is alive on the same thread.
    pub fn new(config: SchedulerConfig, platform: impl Platform + 'static) -> Self {
        let already = APPLICATION_ALIVE.with(|alive| alive.replace(true));
        assert!(!already, "an Application already exists on this thread");

        let scheduler = FrameScheduler::new(config);
        let config = *scheduler.config();
        tracing::info!(
            fixed_interval = ?config.fixed_interval,
            render_interval = ?config.render_interval,
            max_fixed_steps = config.max_fixed_steps,
            upload_budget = ?config.upload_budget,
            "application created"
        );
        Self {
            config,
            layers: LayerStack::new(),
            scheduler,
            platform: Box::new(platform),
            clock: Box::new(SystemClock::new()),
            uploads: Arc::new(UploadQueue::new()),
            shutdown: ShutdownSignal::default(),
            frame_timer: FrameTimer::new(120),
            counters: Counter::new(),
        }
    }

    /// Replace the time source used by [`run`](Self::run).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn push_layer(&mut self, name: impl Into<String>, priority: i32, layer: impl Layer + 'static) -> LayerId {
        self.layers.push(name, priority, layer)
    }

    pub fn pop_layer(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        self.layers.pop(id)
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    /// Queue shared with background decoders.
    pub fn uploads(&self) -> Arc<UploadQueue> {
        self.uploads.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// Loop until the platform quits or shutdown is requested.
    pub fn run(&mut self) {
        tracing::info!(layers = self.layers.len(), "entering run loop");
        while self.run_iteration(self.clock.now()) {}
        let stats = self.stats();
        tracing::info!(
            frames = stats.frames,
            fixed_steps = stats.fixed_steps,
            dropped_steps = stats.dropped_steps,
            "run loop finished"
        );
    }

    /// One loop iteration at time `now`. Returns `false` once the loop
    /// should stop; nothing is dispatched on that iteration.
    pub fn run_iteration(&mut self, now: Duration) -> bool {
        if self.platform.poll_events() == PlatformStatus::Quit {
            tracing::info!("platform requested quit");
            return false;
        }
        if self.shutdown.is_requested() {
            tracing::info!("shutdown requested");
            return false;
        }

        let plan = self.scheduler.plan(now);

        if plan.fixed_steps > 0 {
            self.platform.pump_messages();
            let dt = self.scheduler.fixed_delta();
            for _ in 0..plan.fixed_steps {
                self.layers.pre_fixed_update(dt);
                self.layers.fixed_update(dt);
            }
            self.counters.increment("fixed_steps", u64::from(plan.fixed_steps));
        }
        if plan.dropped_steps > 0 {
            tracing::warn!(
                dropped = plan.dropped_steps,
                max_fixed_steps = self.config.max_fixed_steps,
                "simulation fell behind, dropping fixed steps"
            );
            self.counters.increment("dropped_steps", u64::from(plan.dropped_steps));
        }

        if let Some(delta) = plan.render_delta {
            let drained = self.uploads.drain_for(self.config.upload_budget);
            self.counters.increment("uploads_drained", drained as u64);

            self.platform.begin_frame();
            let dt = delta.as_secs_f32();
            self.layers.update(dt);
            self.layers.late_update(dt);
            self.platform.end_frame();
            self.platform.reset_input_deltas();

            self.frame_timer.record(delta);
            self.counters.increment("frames", 1);
        }
        true
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frames: self.counters.get("frames"),
            fixed_steps: self.counters.get("fixed_steps"),
            dropped_steps: self.counters.get("dropped_steps"),
            uploads_drained: self.counters.get("uploads_drained"),
            fps: self.frame_timer.fps(),
            frame_time_ms: self.frame_timer.frame_time_ms(),
        }
    }

    /// Simulated time advanced so far.
    pub fn sim_time(&self) -> &crate::time::SimulationTime {
        self.scheduler.sim_time()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        // Layers detach before the slot frees up.
        self.layers.clear();
        APPLICATION_ALIVE.with(|alive| alive.set(false));
    }
}
