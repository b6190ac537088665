//! Rolling windows for damping per-frame jitter.
//!
//! Raw landmark estimates flicker from frame to frame. Each signal (yaw,
//! pitch, slouch, presence) keeps the last N readings and classification is
//! based on their mean.

use std::collections::VecDeque;

/// Default number of frames averaged by a window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// A bounded FIFO of recent readings for one signal.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest once over capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Record a presence sample as 1.0 or 0.0.
    pub fn push_flag(&mut self, present: bool) {
        self.push(if present { 1.0 } else { 0.0 });
    }

    /// Arithmetic mean of the current contents, or `default` when empty.
    pub fn mean(&self, default: f64) -> f64 {
        if self.values.is_empty() {
            return default;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Fraction of flagged samples; 0 for an empty window.
    pub fn presence_fraction(&self) -> f64 {
        self.mean(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

/// One window per smoothed signal, owned by a session.
#[derive(Debug, Clone)]
pub struct SignalWindows {
    pub yaw: SmoothingWindow,
    pub pitch: SmoothingWindow,
    pub slouch: SmoothingWindow,
    pub presence: SmoothingWindow,
}

impl SignalWindows {
    pub fn new(capacity: usize) -> Self {
        Self {
            yaw: SmoothingWindow::new(capacity),
            pitch: SmoothingWindow::new(capacity),
            slouch: SmoothingWindow::new(capacity),
            presence: SmoothingWindow::new(capacity),
        }
    }

    /// Smoothed (yaw, pitch), once at least one head pose has been seen.
    pub fn gaze(&self) -> Option<(f64, f64)> {
        if self.yaw.is_empty() {
            return None;
        }
        Some((self.yaw.mean(0.0), self.pitch.mean(0.0)))
    }

    /// Smoothed slouch angle. Keeps the last value while the body is hidden.
    pub fn slouch_deg(&self) -> f64 {
        self.slouch.mean(0.0)
    }
}
