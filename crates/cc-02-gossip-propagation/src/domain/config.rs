//! Forwarding configuration.

use std::time::Duration;

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt before giving up.
    pub max_retries: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Total attempts per destination.
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Configuration for the gossip forwarder and its duplicate cache.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    /// Relays allowed before a payload stops travelling.
    pub max_hops: i64,
    pub retry: RetryPolicy,
    /// Duplicate cache capacity.
    pub duplicate_max_len: usize,
    /// Seconds a fingerprint stays in the duplicate cache.
    pub duplicate_max_age_secs: u64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            max_hops: 1,
            retry: RetryPolicy::default(),
            duplicate_max_len: 1000,
            duplicate_max_age_secs: 60,
        }
    }
}
