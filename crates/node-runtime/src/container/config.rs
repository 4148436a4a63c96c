//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Precedence
//!
//! defaults → TOML file → `CC_*` environment variables → CLI flags.
//! Durations are given in (fractional) seconds.
//!
//! ```toml
//! seeds = ["http://127.0.0.1:5000", "http://127.0.0.1:5001"]
//! port = 5003
//! max_peers = 10
//! min_peers = 2
//! tick_period = 10.0
//! ```

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use cc_01_peer_discovery::DiscoveryConfig;
use cc_02_gossip_propagation::{GossipConfig, RetryPolicy};
use cc_03_round_production::RoundConfig;
use serde::Deserialize;
use shared_types::PeerUrl;
use thiserror::Error;
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Bootstrap node addresses.
    pub seeds: Vec<String>,
    /// Interface the HTTP server binds to.
    pub host: IpAddr,
    /// First port tried for the HTTP server.
    pub port: u16,
    /// Successive ports tried when `port` is taken.
    pub max_port_attempts: u16,
    /// Relay limit for gossip; 1 means "deliver to direct peers only".
    pub max_hops: i64,
    pub max_peers: usize,
    /// Peer count below which the node is not ready.
    pub min_peers: usize,
    /// Per-request timeout for every outbound call.
    pub timeout: f64,
    pub tick_period: f64,
    pub tick_period_margin: f64,
    /// Quiet period after the last `set_port` before the join worker starts.
    pub port_timer_timeout: f64,
    /// Duplicate cache capacity.
    pub expiring_dict_max_len: usize,
    /// Duplicate cache entry lifetime in seconds.
    pub expiring_dict_max_age: u64,
    pub pow_difficulty_bits: u32,
    /// Nodes listening below this port also mutual-add the seeds directly.
    pub joiner_port_threshold: u16,
    pub maintenance_interval: f64,
    pub poll_interval: f64,
    /// Accepted skew between a ping's timestamp and local time, in seconds.
    pub ping_clock_tolerance: u64,
    /// Hex-encoded 32-byte Ed25519 seed. Random identity when absent.
    pub key_seed: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            max_port_attempts: 100,
            max_hops: 1,
            max_peers: 10,
            min_peers: 2,
            timeout: 3.0,
            tick_period: 10.0,
            tick_period_margin: 3.0,
            port_timer_timeout: 2.0,
            expiring_dict_max_len: 1000,
            expiring_dict_max_age: 60,
            pow_difficulty_bits: 12,
            joiner_port_threshold: 5003,
            maintenance_interval: 4.0,
            poll_interval: 1.0,
            ping_clock_tolerance: 60,
            key_seed: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid seed address {seed:?}: {reason}")]
    InvalidSeed { seed: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::parse(&content)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `CC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `CC_*` overrides from an arbitrary lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CC_PORT") {
            self.port = parse_env("CC_PORT", value)?;
        }
        if let Some(value) = lookup("CC_SEEDS") {
            self.seeds = value
                .split(',')
                .map(str::trim)
                .filter(|seed| !seed.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("CC_KEY_SEED") {
            self.key_seed = Some(value);
        }
        if let Some(value) = lookup("CC_MIN_PEERS") {
            self.min_peers = parse_env("CC_MIN_PEERS", value)?;
        }
        if let Some(value) = lookup("CC_MAX_PEERS") {
            self.max_peers = parse_env("CC_MAX_PEERS", value)?;
        }
        Ok(())
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.seed_urls()?;

        if self.max_peers == 0 {
            return Err(ConfigError::Invalid("max_peers must be positive".into()));
        }
        if self.min_peers > self.max_peers {
            return Err(ConfigError::Invalid(format!(
                "min_peers ({}) exceeds max_peers ({})",
                self.min_peers, self.max_peers
            )));
        }
        if self.max_hops < 0 {
            return Err(ConfigError::Invalid("max_hops must not be negative".into()));
        }
        if self.max_port_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_port_attempts must be positive".into(),
            ));
        }
        if self.pow_difficulty_bits > shared_crypto::pow::MAX_DIFFICULTY_BITS {
            return Err(ConfigError::Invalid(format!(
                "pow_difficulty_bits must be at most {}",
                shared_crypto::pow::MAX_DIFFICULTY_BITS
            )));
        }
        if self.expiring_dict_max_len == 0 {
            return Err(ConfigError::Invalid(
                "expiring_dict_max_len must be positive".into(),
            ));
        }

        for (name, value) in [
            ("timeout", self.timeout),
            ("tick_period", self.tick_period),
            ("tick_period_margin", self.tick_period_margin),
            ("port_timer_timeout", self.port_timer_timeout),
            ("maintenance_interval", self.maintenance_interval),
            ("poll_interval", self.poll_interval),
        ] {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        if secs(self.tick_period)
            .checked_add(secs(self.tick_period_margin))
            .is_none()
        {
            return Err(ConfigError::Invalid(
                "tick_period + tick_period_margin is out of range".into(),
            ));
        }
        if self.timeout == 0.0 {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }

        if let Some(seed) = &self.key_seed {
            shared_crypto::Credentials::from_seed_hex(seed)
                .map_err(|e| ConfigError::Invalid(format!("key_seed: {e}")))?;
        }
        Ok(())
    }

    /// Seeds in canonical form.
    pub fn seed_urls(&self) -> Result<Vec<PeerUrl>, ConfigError> {
        self.seeds
            .iter()
            .map(|seed| {
                PeerUrl::parse(seed).map_err(|e| ConfigError::InvalidSeed {
                    seed: seed.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.timeout)
    }

    pub fn discovery_config(&self) -> Result<DiscoveryConfig, ConfigError> {
        Ok(DiscoveryConfig {
            seeds: self.seed_urls()?,
            max_peers: self.max_peers,
            min_peers: self.min_peers,
            port_timer_timeout: secs(self.port_timer_timeout),
            joiner_port_threshold: self.joiner_port_threshold,
            maintenance_interval: secs(self.maintenance_interval),
            ..DiscoveryConfig::default()
        })
    }

    pub fn gossip_config(&self) -> GossipConfig {
        GossipConfig {
            max_hops: self.max_hops,
            retry: RetryPolicy::default(),
            duplicate_max_len: self.expiring_dict_max_len,
            duplicate_max_age_secs: self.expiring_dict_max_age,
        }
    }

    pub fn round_config(&self) -> RoundConfig {
        RoundConfig {
            tick_period: secs(self.tick_period),
            tick_period_margin: secs(self.tick_period_margin),
            poll_interval: secs(self.poll_interval),
            ping_clock_tolerance_secs: self.ping_clock_tolerance,
            pow_difficulty_bits: self.pow_difficulty_bits,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

/// Seconds as a `Duration`. Only meaningful after `validate`, which
/// rejects every value this would clamp.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
