//! Inbound ports (API) for peer discovery.

use std::net::IpAddr;

use async_trait::async_trait;
use shared_types::{JoinRequest, PeerUrl, SigningAddress};

use crate::domain::DiscoveryError;

/// Primary API of the discovery subsystem.
#[async_trait]
pub trait PeerDiscoveryApi: Send + Sync {
    /// Ask every unregistered candidate to add us, registering those that accept.
    /// Returns the number of peers added.
    async fn mutual_add(&self, candidates: &[PeerUrl]) -> usize;

    /// Collect the peer lists of `from` and return a random sample of their union.
    async fn sample_further_peers(&self, from: &[PeerUrl], sample_size: usize) -> Vec<PeerUrl>;

    /// Handle a join request arriving from `remote_ip`.
    ///
    /// On success returns the local signing address, which the caller sends
    /// back to the requester.
    fn accept_join(
        &self,
        remote_ip: IpAddr,
        request: &JoinRequest,
    ) -> Result<SigningAddress, DiscoveryError>;

    /// Whether the node has at least `min_peers` peers.
    fn is_ready(&self) -> bool;
}
