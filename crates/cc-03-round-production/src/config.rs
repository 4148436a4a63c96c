//! Configuration types for round production

use std::time::Duration;

/// Runtime configuration for the round loops.
#[derive(Clone, Debug)]
pub struct RoundConfig {
    /// Expected round length.
    pub tick_period: Duration,
    /// Extra wait on top of `tick_period` so late pings still make the tick.
    pub tick_period_margin: Duration,
    /// Idle interval between polls while a loop's preconditions are unmet.
    pub poll_interval: Duration,
    /// Accepted distance between a ping's timestamp and local time.
    pub ping_clock_tolerance_secs: u64,
    /// Leading zero bits required of ping and tick digests.
    pub pow_difficulty_bits: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(10),
            tick_period_margin: Duration::from_secs(3),
            poll_interval: Duration::from_secs(1),
            ping_clock_tolerance_secs: 60,
            pow_difficulty_bits: 12,
        }
    }
}

impl RoundConfig {
    /// Total wait between adding a ping and building a tick.
    pub fn tick_wait(&self) -> Duration {
        self.tick_period.saturating_add(self.tick_period_margin)
    }

    /// Cheap mining, no waits; for tests.
    pub fn for_testing() -> Self {
        Self {
            tick_period: Duration::ZERO,
            tick_period_margin: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
            ping_clock_tolerance_secs: 60,
            pow_difficulty_bits: 4,
        }
    }
}
