//! Outbound ports (SPI) for round production.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::GossipRoute;

/// Whether the node is connected well enough to take part in rounds.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self) -> bool;
}

/// Gossip sink for locally produced pings and ticks.
///
/// Fire and forget: delivery failures are the broadcaster's concern.
#[async_trait]
pub trait ArtifactBroadcaster: Send + Sync {
    async fn broadcast(&self, route: GossipRoute, payload: Value);
}
