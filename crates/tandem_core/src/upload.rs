//! Work handed from background threads to the frame loop
//!
//! Decoders push closures from any thread; the frame loop drains as many as
//! fit in a time budget each frame. The queue lock is never held while a
//! task runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub type UploadTask = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct UploadQueue {
    tasks: Mutex<VecDeque<UploadTask>>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: impl FnOnce() + Send + 'static) {
        self.lock().push_back(Box::new(task));
    }

    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    /// Run queued tasks until the queue is empty or `budget` has elapsed.
    ///
    /// At least one task runs when any are queued, so a budget smaller than
    /// a single task still makes progress. Returns how many ran.
    pub fn drain_for(&self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut ran = 0;
        loop {
            if ran > 0 && start.elapsed() >= budget {
                break;
            }
            // Pop under the lock, run without it.
            let Some(task) = self.lock().pop_front() else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, pending = self.pending_len(), "drained uploads");
        }
        ran
    }

    /// Run everything queued, including tasks queued while draining.
    pub fn drain_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = self.lock().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<UploadTask>> {
        // A panicking task never holds the lock, so the data is intact.
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
