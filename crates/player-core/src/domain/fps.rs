//! Rolling frames-per-second estimate.
//!
//! Each decoded frame after the first yields one instantaneous rate
//! `1000 / interval_ms`.  The last `capacity` rates are kept and the reported
//! FPS is their rounded arithmetic mean.

use std::collections::VecDeque;
use std::time::Instant;

/// Default number of samples in the window.
pub const DEFAULT_FPS_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct FpsEstimator {
    window: VecDeque<f64>,
    capacity: usize,
    last_frame_at: Option<Instant>,
    fps: u32,
}

impl FpsEstimator {
    /// Creates an estimator holding at most `capacity` samples.  A capacity
    /// of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { window: VecDeque::with_capacity(capacity), capacity, last_frame_at: None, fps: 0 }
    }

    /// Records a decoded frame observed at `now` and returns the current FPS.
    ///
    /// The first frame after construction or [`reset`](Self::reset) only sets
    /// the reference timestamp.  A zero interval yields no sample.
    pub fn record_frame(&mut self, now: Instant) -> u32 {
        if let Some(previous) = self.last_frame_at {
            let interval_ms = now.saturating_duration_since(previous).as_secs_f64() * 1000.0;
            if interval_ms > 0.0 {
                self.push_sample(1000.0 / interval_ms);
            }
        }
        self.last_frame_at = Some(now);
        self.fps
    }

    fn push_sample(&mut self, rate: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(rate);
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.fps = mean.round() as u32;
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Number of samples currently in the window.
    pub fn samples(&self) -> usize {
        self.window.len()
    }

    /// Clears the window, the reported FPS and the reference timestamp.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_frame_at = None;
        self.fps = 0;
    }
}

impl Default for FpsEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
