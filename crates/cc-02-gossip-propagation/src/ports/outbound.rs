//! Outbound ports (SPI) for gossip propagation.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{HopCount, PeerEntry, PeerUrl, SigningAddress, TransportError};

/// View of the peer table the forwarder works from.
pub trait PeerDirectory: Send + Sync {
    /// Point-in-time copy of the known peers.
    fn snapshot(&self) -> Vec<PeerEntry>;

    /// Drop a peer that stopped answering. Returns whether it was present.
    fn evict(&self, peer: &PeerUrl) -> bool;
}

/// Single-shot delivery of a payload to one peer.
#[async_trait]
pub trait GossipTransport: Send + Sync {
    /// `POST {peer}/forward/{route}?addr={origin}&redistribute={hops}`
    ///
    /// Any HTTP answer counts as delivered; only failing to get one is an error.
    async fn deliver(
        &self,
        peer: &PeerUrl,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
        payload: &Value,
    ) -> Result<(), TransportError>;
}
