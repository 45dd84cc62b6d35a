//! Configuration for the OptoFlood core.

use serde::Deserialize;
use std::time::Duration;

/// Tunable knobs for the TFIB and the flood controller.
///
/// All durations are expressed in milliseconds so the struct can be
/// deserialized from flat configuration files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial hop budget when a packet carries no hop-limit tag.
    pub default_hop_limit: u8,

    /// Lifetime of a temporary forwarding entry.
    pub tfib_lifetime_ms: u64,

    /// Period of the TFIB expiry sweep.
    pub cleanup_interval_ms: u64,

    /// Retention window for observed flood identifiers.
    pub flood_id_ttl_ms: u64,

    /// Ceiling on the number of remembered flood identifiers.
    pub max_flood_ids: usize,

    /// Maximum flood fan-outs admitted per rate window.
    pub rate_limit: u32,

    /// Length of the flood rate window.
    pub rate_window_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_hop_limit: 3,
            tfib_lifetime_ms: 1000,
            cleanup_interval_ms: 100,
            flood_id_ttl_ms: 5000,
            max_flood_ids: 4096,
            rate_limit: 100,
            rate_window_ms: 1000,
        }
    }
}

impl Config {
    pub fn tfib_lifetime(&self) -> Duration {
        Duration::from_millis(self.tfib_lifetime_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn flood_id_ttl(&self) -> Duration {
        Duration::from_millis(self.flood_id_ttl_ms)
    }

    /// Period of the dedup cache sweep, one fifth of the retention window.
    pub fn dedup_sweep_interval(&self) -> Duration {
        Duration::from_millis((self.flood_id_ttl_ms / 5).max(1))
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.default_hop_limit, 3);
        assert_eq!(cfg.tfib_lifetime(), Duration::from_secs(1));
        assert_eq!(cfg.cleanup_interval(), Duration::from_millis(100));
        assert_eq!(cfg.flood_id_ttl(), Duration::from_secs(5));
        assert_eq!(cfg.dedup_sweep_interval(), Duration::from_secs(1));
        assert_eq!(cfg.max_flood_ids, 4096);
        assert_eq!(cfg.rate_limit, 100);
        assert_eq!(cfg.rate_window(), Duration::from_secs(1));
    }
}
