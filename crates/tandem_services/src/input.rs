//! Input state shared between the platform and gameplay

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tandem_core::math::Vec2;

/// Held keys plus mouse motion accumulated since the last rendered frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<u32>,
    mouse_delta: Vec2,
    scroll_delta: f32,
    sensitivity: f32,
}

/// Platform and layers see the same input.
pub type SharedInput = Rc<RefCell<InputState>>;

impl InputState {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            ..Self::default()
        }
    }

    pub fn shared(sensitivity: f32) -> SharedInput {
        Rc::new(RefCell::new(Self::new(sensitivity)))
    }

    pub fn press(&mut self, key: u32) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: u32) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: u32) -> bool {
        self.held.contains(&key)
    }

    pub fn add_mouse_motion(&mut self, raw: Vec2) {
        self.mouse_delta += raw * self.sensitivity;
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Sensitivity-scaled mouse motion this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear per-frame accumulators. Held keys persist.
    pub fn reset_frame_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_reset_but_keys_stay_held() {
        let mut input = InputState::new(2.0);
        input.press(32);
        input.add_mouse_motion(Vec2::new(1.0, -1.0));
        input.add_mouse_motion(Vec2::new(1.0, 0.0));
        input.add_scroll(1.0);
        assert_eq!(input.mouse_delta(), Vec2::new(4.0, -2.0));

        input.reset_frame_deltas();

        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.scroll_delta(), 0.0);
        assert!(input.is_held(32));
        input.release(32);
        assert!(!input.is_held(32));
    }
}
