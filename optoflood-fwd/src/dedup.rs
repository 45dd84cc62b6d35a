//! Duplicate suppression for flood identifiers.
//!
//! Each mobility event carries a producer-chosen FloodId; a forwarder
//! processes the first arrival and drops every repeat seen within the
//! retention window. The cache purges lazily on insert and is additionally
//! swept by the forwarder reactor.

use log::{debug, trace};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-windowed set of recently observed flood identifiers.
#[derive(Debug)]
pub struct FloodIdCache {
    // flood id -> first seen
    entries: HashMap<u64, Instant>,
    ttl: Duration,
    capacity: usize,
}

impl FloodIdCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Returns true iff `id` was observed within the retention window.
    pub fn seen(&self, id: u64) -> bool {
        match self.entries.get(&id) {
            Some(first_seen) => first_seen.elapsed() <= self.ttl,
            None => false,
        }
    }

    /// Records an observation of `id`, refreshing its first-seen timestamp.
    ///
    /// Entries beyond the retention window are purged on every call; when
    /// the cache is full the oldest entry is evicted.
    pub fn remember(&mut self, id: u64) {
        let now = Instant::now();
        self.purge(now);

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&id) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, &first_seen)| first_seen)
                .map(|(&id, _)| id);
            if let Some(oldest) = oldest {
                debug!("cache full, evicting flood id {}", oldest);
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(id, now);
        trace!("remembered flood id {}", id);
    }

    /// Periodic purge of entries beyond the retention window.
    pub fn sweep(&mut self) {
        self.purge(Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, first_seen| now.saturating_duration_since(*first_seen) <= ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn remember_and_seen() {
        let mut cache = FloodIdCache::new(Duration::from_secs(5), 16);
        assert!(!cache.seen(42));

        cache.remember(42);
        assert!(cache.seen(42));
        assert!(!cache.seen(43));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = FloodIdCache::new(Duration::from_millis(10), 16);
        cache.remember(1);
        assert!(cache.seen(1));

        sleep(Duration::from_millis(20));
        assert!(!cache.seen(1));

        // Lazy purge on the next remember drops the stale entry
        cache.remember(2);
        assert_eq!(cache.len(), 1);

        cache.sweep();
        assert!(cache.seen(2));
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let mut cache = FloodIdCache::new(Duration::from_secs(5), 2);
        cache.remember(1);
        sleep(Duration::from_millis(2));
        cache.remember(2);
        sleep(Duration::from_millis(2));
        cache.remember(3);

        assert_eq!(cache.len(), 2);
        assert!(!cache.seen(1));
        assert!(cache.seen(2));
        assert!(cache.seen(3));
    }

    #[test]
    fn remember_refreshes_existing() {
        let mut cache = FloodIdCache::new(Duration::from_millis(100), 16);
        cache.remember(7);
        sleep(Duration::from_millis(60));
        cache.remember(7);
        sleep(Duration::from_millis(60));

        // 120 ms after the first observation, still within the refreshed window
        assert!(cache.seen(7));
        assert_eq!(cache.len(), 1);
    }
}
