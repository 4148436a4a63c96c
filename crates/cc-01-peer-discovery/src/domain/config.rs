//! Discovery tuning knobs.

use std::time::Duration;

use shared_types::PeerUrl;

/// Configuration for the join protocol and peer table.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Well-known addresses contacted at bootstrap.
    pub seeds: Vec<PeerUrl>,
    /// Upper bound on the registry size.
    pub max_peers: usize,
    /// Below this many peers the node is not ready and keeps discovering.
    pub min_peers: usize,
    /// Quiet period after the last `set_port` before the join worker starts.
    pub port_timer_timeout: Duration,
    /// Nodes listening below this port also mutual-add the seeds directly.
    pub joiner_port_threshold: u16,
    /// Period of the maintenance loop.
    pub maintenance_interval: Duration,
    /// Fixed part of the join worker's startup delay.
    pub join_base_delay: Duration,
    /// Upper bound of the random part of the startup delay.
    pub join_jitter: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            max_peers: 10,
            min_peers: 2,
            port_timer_timeout: Duration::from_secs(2),
            joiner_port_threshold: 5003,
            maintenance_interval: Duration::from_secs(4),
            join_base_delay: Duration::from_secs(2),
            join_jitter: Duration::from_secs(3),
        }
    }
}

impl DiscoveryConfig {
    /// Zero delays, small table; for tests.
    pub fn for_testing() -> Self {
        Self {
            port_timer_timeout: Duration::from_millis(100),
            maintenance_interval: Duration::from_millis(10),
            join_base_delay: Duration::ZERO,
            join_jitter: Duration::ZERO,
            max_peers: 4,
            min_peers: 2,
            ..Self::default()
        }
    }
}
