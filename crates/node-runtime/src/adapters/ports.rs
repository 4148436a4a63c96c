//! Bridges that let one subsystem satisfy another's outbound port.

use std::sync::Arc;

use async_trait::async_trait;
use cc_01_peer_discovery::{DiscoveryService, DiscoveryTransport, PeerDiscoveryApi, PeerRegistry};
use cc_02_gossip_propagation::{GossipApi, PeerDirectory};
use cc_03_round_production::{ArtifactBroadcaster, ReadinessProbe};
use serde_json::Value;
use shared_types::{GossipRoute, HopCount, PeerEntry, PeerUrl, SigningAddress};
use tracing::debug;

/// Peer registry as the gossip forwarder's directory.
pub struct RegistryDirectory {
    registry: Arc<PeerRegistry>,
}

impl RegistryDirectory {
    pub fn new(registry: Arc<PeerRegistry>) -> Self {
        Self { registry }
    }
}

impl PeerDirectory for RegistryDirectory {
    fn snapshot(&self) -> Vec<PeerEntry> {
        self.registry.snapshot()
    }

    fn evict(&self, peer: &PeerUrl) -> bool {
        self.registry.unregister_url(peer)
    }
}

/// Discovery readiness as the round synchronizer's gate.
pub struct DiscoveryReadiness<T: DiscoveryTransport> {
    discovery: Arc<DiscoveryService<T>>,
}

impl<T: DiscoveryTransport> DiscoveryReadiness<T> {
    pub fn new(discovery: Arc<DiscoveryService<T>>) -> Self {
        Self { discovery }
    }
}

impl<T: DiscoveryTransport> ReadinessProbe for DiscoveryReadiness<T> {
    fn is_ready(&self) -> bool {
        self.discovery.is_ready()
    }
}

/// Gossip forwarder as the round synchronizer's broadcaster.
///
/// Own artifacts leave with hop count 0 and the local address as origin.
/// They are recorded in the duplicate cache first so that echoes from peers
/// are dropped at the route boundary.
pub struct GossipBroadcaster<G: GossipApi> {
    gossip: Arc<G>,
    local_address: SigningAddress,
}

impl<G: GossipApi> GossipBroadcaster<G> {
    pub fn new(gossip: Arc<G>, local_address: SigningAddress) -> Self {
        Self {
            gossip,
            local_address,
        }
    }
}

#[async_trait]
impl<G: GossipApi> ArtifactBroadcaster for GossipBroadcaster<G> {
    async fn broadcast(&self, route: GossipRoute, payload: Value) {
        self.gossip.mark_seen(&payload);
        let report = self
            .gossip
            .forward(&payload, route.as_str(), &self.local_address, HopCount::ORIGIN)
            .await;
        debug!(
            route = %route,
            attempted = report.attempted,
            delivered = report.delivered,
            "Broadcast own artifact"
        );
    }
}
