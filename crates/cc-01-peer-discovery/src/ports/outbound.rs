//! Outbound ports (SPI) for peer discovery.

use async_trait::async_trait;
use shared_types::{JoinRequest, PeerUrl, SigningAddress, TransportError};

/// How a remote node answered a mutual-add request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutualAddReply {
    /// 201: the remote registered us and told us its signing address.
    Accepted(SigningAddress),
    /// 503: the remote is at its peer maximum.
    AtCapacity,
    /// Any other status.
    Rejected(u16),
}

/// Requests the join protocol sends to other nodes.
///
/// Implementations apply the configured request timeout.
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// `POST {peer}/mutual_add`
    async fn request_mutual_add(
        &self,
        peer: &PeerUrl,
        request: &JoinRequest,
    ) -> Result<MutualAddReply, TransportError>;

    /// `GET {peer}/info/peers`, returning the raw address list.
    async fn fetch_peers(&self, peer: &PeerUrl) -> Result<Vec<String>, TransportError>;
}
