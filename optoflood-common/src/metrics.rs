//! Metrics primitives for the OptoFlood core.
//!
//! Counters and gauges are Relaxed atomics aggregated into structs owned
//! by the component they describe. There is no global metrics state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing event counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Clone for Counter {
    // a clone carries the observed value, not the live cell
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.value()))
    }
}

/// Instantaneous quantity that moves in both directions.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Clone for Gauge {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.value()))
    }
}

/// Aggregate metrics for the flood controller.
#[derive(Debug, Default, Clone)]
pub struct FloodMetrics {
    /// Mobility-marked Data packets accepted for processing
    pub flood_data_ingested: Counter,
    /// Arrivals dropped because their FloodId was already seen
    pub flood_duplicates_dropped: Counter,
    /// Egress copies handed to the sender
    pub flood_copies_emitted: Counter,
    /// Fan-outs suppressed by the rate limiter
    pub rate_limit_drops: Counter,
    /// Packets dropped because a field failed to decode
    pub malformed_drops: Counter,
}

impl FloodMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}
