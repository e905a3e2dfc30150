//! Tandem Services Layer
//!
//! Host-side services: settings, input, and a headless platform for
//! running the frame loop without a window.

pub mod input;
pub mod settings;

pub use input::{InputState, SharedInput};
pub use settings::{Settings, SettingsError};

use tandem_core::platform::{Platform, PlatformStatus};

/// Runs the frame loop without a window, optionally for a fixed number of
/// rendered frames.
pub struct HeadlessPlatform {
    input: SharedInput,
    frame_limit: Option<u64>,
    frames: u64,
}

impl HeadlessPlatform {
    pub fn new(input: SharedInput) -> Self {
        Self {
            input,
            frame_limit: None,
            frames: 0,
        }
    }

    /// Quit once `frames` frames have been presented.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn input(&self) -> &SharedInput {
        &self.input
    }
}

impl Platform for HeadlessPlatform {
    fn poll_events(&mut self) -> PlatformStatus {
        match self.frame_limit {
            Some(limit) if self.frames >= limit => PlatformStatus::Quit,
            _ => PlatformStatus::Continue,
        }
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }

    fn reset_input_deltas(&mut self) {
        self.input.borrow_mut().reset_frame_deltas();
    }
}
