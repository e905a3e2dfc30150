//! Window/input boundary used by the frame loop

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformStatus {
    Continue,
    Quit,
}

/// Host integration: event polling and frame bracketing.
///
/// Only [`poll_events`](Platform::poll_events) is required; a headless
/// host can ignore the rest.
pub trait Platform {
    /// Poll pending window/input events once per loop iteration.
    fn poll_events(&mut self) -> PlatformStatus;

    /// Pump the native message loop ahead of fixed steps.
    fn pump_messages(&mut self) {}

    fn begin_frame(&mut self) {}

    /// End the frame and present it.
    fn end_frame(&mut self) {}

    /// Clear per-frame input accumulators such as mouse deltas.
    fn reset_input_deltas(&mut self) {}
}

/// A platform that never asks to quit and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlatform;

impl Platform for NullPlatform {
    fn poll_events(&mut self) -> PlatformStatus {
        PlatformStatus::Continue
    }
}
