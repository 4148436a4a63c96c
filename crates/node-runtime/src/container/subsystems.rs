//! # Subsystem Container
//!
//! Holds all subsystem instances and the adapters connecting them.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Credentials, Peer Registry, Clockchain (no dependencies)
//! Level 1: Peer Discovery (registry + transport)
//! Level 2: Gossip Forwarder (registry as PeerDirectory + transport)
//! Level 3: Round Synchronizer (discovery as ReadinessProbe,
//!          gossip as ArtifactBroadcaster)
//! ```
//!
//! The transport is a type parameter: the binary uses `HttpTransport`,
//! cross-crate tests plug in an in-memory network.

use std::sync::Arc;

use cc_01_peer_discovery::{DiscoveryService, DiscoveryTransport, PeerRegistry};
use cc_02_gossip_propagation::{DuplicateCache, GossipForwarder, GossipTransport};
use cc_03_round_production::{Clockchain, RoundSynchronizer};
use shared_crypto::Credentials;
use shared_types::{Sleeper, SystemTimeSource, TimeSource, TokioSleeper};
use tracing::info;

use crate::adapters::{DiscoveryReadiness, GossipBroadcaster, RegistryDirectory};
use crate::container::config::{ConfigError, NodeConfig};
use crate::handlers::AppState;

/// Outbound transport serving both discovery and gossip.
pub trait NodeTransport: DiscoveryTransport + GossipTransport + 'static {}

impl<T: DiscoveryTransport + GossipTransport + 'static> NodeTransport for T {}

/// Gossip forwarder over the peer registry.
pub type NodeGossip<T> = GossipForwarder<RegistryDirectory, T>;

/// Round synchronizer gated on discovery and broadcasting through gossip.
pub type NodeRounds<T> =
    RoundSynchronizer<DiscoveryReadiness<T>, GossipBroadcaster<NodeGossip<T>>>;

/// Central container holding all subsystem instances.
pub struct NodeContainer<T: NodeTransport> {
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
    pub credentials: Arc<Credentials>,
    pub registry: Arc<PeerRegistry>,
    pub chain: Arc<Clockchain>,
    pub transport: Arc<T>,
    pub discovery: Arc<DiscoveryService<T>>,
    pub gossip: Arc<NodeGossip<T>>,
    pub rounds: Arc<NodeRounds<T>>,
}

impl<T: NodeTransport> NodeContainer<T> {
    /// Build every subsystem with the system clock and tokio timers.
    pub fn new(config: NodeConfig, transport: Arc<T>) -> Result<Self, ConfigError> {
        Self::with_time(
            config,
            transport,
            Arc::new(SystemTimeSource),
            Arc::new(TokioSleeper),
        )
    }

    pub fn with_time(
        config: NodeConfig,
        transport: Arc<T>,
        clock: Arc<dyn TimeSource>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let credentials = Arc::new(match &config.key_seed {
            Some(seed) => Credentials::from_seed_hex(seed)
                .map_err(|e| ConfigError::Invalid(format!("key_seed: {e}")))?,
            None => Credentials::generate(),
        });
        let local_address = credentials.signing_address().clone();
        info!(address = %local_address, "Node identity ready");

        // Level 0
        let registry = Arc::new(PeerRegistry::new(local_address.clone(), config.max_peers));
        let chain = Arc::new(Clockchain::new());

        // Level 1
        let discovery = Arc::new(DiscoveryService::new(
            config.discovery_config()?,
            Arc::clone(&registry),
            Arc::clone(&transport),
            Arc::clone(&credentials),
            Arc::clone(&sleeper),
        ));
        info!("  [1] Peer Discovery initialized (max {} peers)", config.max_peers);

        // Level 2
        let gossip_config = config.gossip_config();
        let duplicates = Arc::new(DuplicateCache::new(
            gossip_config.duplicate_max_len,
            gossip_config.duplicate_max_age_secs,
            Arc::clone(&clock),
        ));
        let gossip = Arc::new(GossipForwarder::new(
            gossip_config,
            local_address.clone(),
            duplicates,
            Arc::new(RegistryDirectory::new(Arc::clone(&registry))),
            Arc::clone(&transport),
            Arc::clone(&sleeper),
        ));
        info!("  [2] Gossip initialized (max_hops={})", config.max_hops);

        // Level 3
        let rounds = Arc::new(RoundSynchronizer::new(
            config.round_config(),
            Arc::clone(&chain),
            Arc::clone(&credentials),
            Arc::new(DiscoveryReadiness::new(Arc::clone(&discovery))),
            Arc::new(GossipBroadcaster::new(Arc::clone(&gossip), local_address)),
            clock,
            sleeper,
        ));
        info!(
            "  [3] Round production initialized (difficulty={} bits)",
            config.pow_difficulty_bits
        );

        Ok(Self {
            config,
            credentials,
            registry,
            chain,
            transport,
            discovery,
            gossip,
            rounds,
        })
    }

    /// Handler state for the HTTP router.
    pub fn app_state(&self) -> AppState {
        AppState {
            discovery: self.discovery.clone(),
            registry: Arc::clone(&self.registry),
            gossip: self.gossip.clone(),
            rounds: self.rounds.clone(),
        }
    }

    /// Stop the join worker and both round loops.
    pub fn shutdown(&self) {
        self.discovery.shutdown();
        self.rounds.shutdown();
    }
}
