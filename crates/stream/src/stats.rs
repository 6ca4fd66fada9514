use std::collections::VecDeque;
use std::time::Duration;

/// What the last stream update did, for instrumentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub materialized_this_tick: usize,
    pub retired_this_tick: usize,
    pub live_segments: usize,
    /// Total segments built since the stream was created.
    pub materialized_total: usize,
    pub retired_total: usize,
    pub cursor: usize,
    pub end_of_field: bool,
    /// Live segments exceeded the configured soft limit.
    pub over_limit: bool,
    /// Times the live count rose above the soft limit.
    pub limit_crossings: usize,
    pub update_time: Duration,
}

/// Rolling window of recent durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    capacity: usize,
    total: Duration,
}

impl FrameTimer {
    /// A timer keeping the last `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total: Duration::ZERO,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.capacity {
            if let Some(old) = self.window.pop_front() {
                self.total -= old;
            }
        }
        self.window.push_back(dt);
        self.total += dt;
    }

    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.total / n as u32,
        }
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn last(&self) -> Option<Duration> {
        self.window.back().copied()
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }
}
