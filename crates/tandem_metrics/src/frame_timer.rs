//! Rolling frame statistics fed with measured frame deltas

use super::ring_buffer::RingBuffer;
use std::time::Duration;

pub struct FrameTimer {
    frame_times: RingBuffer<Duration>,
    frames: u64,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_times: RingBuffer::new(capacity),
            frames: 0,
        }
    }

    /// Record the delta of one presented frame.
    pub fn record(&mut self, delta: Duration) {
        self.frame_times.push(delta);
        self.frames += 1;
    }

    /// Total frames recorded, not just the ones still in the window.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        let avg = self.frame_times.average().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_follows_recorded_deltas() {
        let mut timer = FrameTimer::new(4);
        for _ in 0..8 {
            timer.record(Duration::from_millis(20));
        }
        assert_eq!(timer.frames(), 8);
        assert!((timer.fps() - 50.0).abs() < 1e-6);
        assert!((timer.frame_time_ms() - 20.0).abs() < 1e-6);
    }
}
