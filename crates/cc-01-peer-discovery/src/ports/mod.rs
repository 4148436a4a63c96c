//! Ports layer: what the discovery service offers and what it needs.

pub mod inbound;
pub mod outbound;

pub use inbound::PeerDiscoveryApi;
pub use outbound::{DiscoveryTransport, MutualAddReply};
