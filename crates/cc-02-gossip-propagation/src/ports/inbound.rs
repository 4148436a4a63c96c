//! Inbound ports (API) for gossip propagation.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{HopCount, SigningAddress};

use crate::domain::ForwardReport;

/// Primary API for gossip.
#[async_trait]
pub trait GossipApi: Send + Sync {
    /// Relay `payload` on `route` to every known peer except `origin`.
    ///
    /// `hops` is the count the payload arrived with (or [`HopCount::ORIGIN`]
    /// for locally produced payloads).
    async fn forward(
        &self,
        payload: &Value,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
    ) -> ForwardReport;

    /// Duplicate check for an inbound payload; records it when new.
    fn is_duplicate(&self, payload: &Value) -> bool;

    /// Record a locally produced payload so its echo is dropped.
    fn mark_seen(&self, payload: &Value);
}
