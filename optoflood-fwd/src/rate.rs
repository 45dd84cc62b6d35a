//! Flood emission rate limiting.

use log::warn;
use std::time::{Duration, Instant};

/// Sliding-window admission counter for flood fan-outs.
///
/// One admission covers one ingress flood event regardless of how many
/// egress copies it produces. Overflow is logged, never an error.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Consumes one admission slot; returns false when the window is full.
    pub fn admit(&mut self) -> bool {
        let now = Instant::now();
        if now.saturating_duration_since(self.window_start) > self.window {
            self.window_start = now;
            self.count = 0;
        }

        if self.count < self.limit {
            self.count += 1;
            true
        } else {
            warn!("flood rate limit of {} per window exceeded", self.limit);
            false
        }
    }

    /// Admissions consumed in the current window.
    pub fn current_count(&self) -> u32 {
        self.count
    }
}
