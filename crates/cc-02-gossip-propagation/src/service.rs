//! # Gossip Forwarder
//!
//! Hop-limited flooding over the peer table.
//!
//! ## Relay Rules
//!
//! 1. A hop count of `-1` is delivered but never relayed.
//! 2. A hop count at or above `max_hops` is not relayed.
//! 3. Otherwise the count is incremented and the payload goes to every peer
//!    in one registry snapshot whose signing address differs from the origin.
//!
//! ## Failure Handling
//!
//! Each destination gets up to `max_retries` retries with a fixed pause in
//! between. Timeouts and refused connections are expected and logged at
//! debug level; anything else is logged as an error but retried the same way.
//! A destination that exhausts its retries is evicted from the registry and
//! the remaining destinations are unaffected.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use shared_types::{HopCount, PeerUrl, SigningAddress, Sleeper};
use tracing::{debug, error, info, warn};

use crate::domain::{DuplicateCache, ForwardReport, GossipConfig};
use crate::events::GossipError;
use crate::ports::inbound::GossipApi;
use crate::ports::outbound::{GossipTransport, PeerDirectory};

/// Gossip forwarder.
///
/// Generic over its two outbound ports:
/// - `D: PeerDirectory` - registry snapshot and eviction
/// - `T: GossipTransport` - single-shot delivery
pub struct GossipForwarder<D, T>
where
    D: PeerDirectory,
    T: GossipTransport,
{
    config: GossipConfig,
    /// Address placed in the `addr` parameter of every relayed payload.
    local_address: SigningAddress,
    duplicates: Arc<DuplicateCache>,
    directory: Arc<D>,
    transport: Arc<T>,
    sleeper: Arc<dyn Sleeper>,
}

impl<D, T> GossipForwarder<D, T>
where
    D: PeerDirectory,
    T: GossipTransport,
{
    pub fn new(
        config: GossipConfig,
        local_address: SigningAddress,
        duplicates: Arc<DuplicateCache>,
        directory: Arc<D>,
        transport: Arc<T>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            local_address,
            duplicates,
            directory,
            transport,
            sleeper,
        }
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    pub fn duplicates(&self) -> &Arc<DuplicateCache> {
        &self.duplicates
    }

    async fn relay(
        &self,
        payload: &Value,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
    ) -> ForwardReport {
        let Some(next) = hops.next_within(self.config.max_hops) else {
            debug!(route, %hops, "[cc-02] Hop limit reached, not relaying");
            return ForwardReport::not_relayed();
        };

        let targets: Vec<PeerUrl> = self
            .directory
            .snapshot()
            .into_iter()
            .filter(|entry| &entry.signing_address != origin)
            .map(|entry| entry.url)
            .collect();

        let outcomes = join_all(
            targets
                .iter()
                .map(|peer| self.deliver_with_retry(peer, route, next, payload)),
        )
        .await;

        let mut report = ForwardReport {
            hops: Some(next),
            attempted: targets.len(),
            ..ForwardReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(GossipError::RetriesExhausted { peer, .. }) => report.evicted.push(peer),
            }
        }

        if !report.evicted.is_empty() {
            info!(
                route,
                evicted = report.evicted.len(),
                "[cc-02] Evicted unreachable peers"
            );
        }
        debug!(
            route,
            hops = %next,
            attempted = report.attempted,
            delivered = report.delivered,
            "[cc-02] Relay complete"
        );
        report
    }

    /// Deliver to one peer, retrying per policy and evicting on exhaustion.
    async fn deliver_with_retry(
        &self,
        peer: &PeerUrl,
        route: &str,
        hops: HopCount,
        payload: &Value,
    ) -> Result<(), GossipError> {
        let policy = self.config.retry;
        let mut retries = 0;

        loop {
            let error = match self
                .transport
                .deliver(peer, route, &self.local_address, hops, payload)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if error.is_transport() {
                debug!(peer = %peer, retries, "[cc-02] Delivery failed: {error}");
            } else {
                error!(peer = %peer, retries, "[cc-02] Unexpected delivery failure: {error}");
            }

            if retries >= policy.max_retries {
                warn!(
                    peer = %peer,
                    attempts = policy.attempts(),
                    "[cc-02] Giving up on peer, removing from registry"
                );
                self.directory.evict(peer);
                return Err(GossipError::RetriesExhausted {
                    peer: peer.clone(),
                    attempts: policy.attempts(),
                    last: error,
                });
            }

            retries += 1;
            self.sleeper.sleep(policy.delay).await;
        }
    }
}

#[async_trait]
impl<D, T> GossipApi for GossipForwarder<D, T>
where
    D: PeerDirectory,
    T: GossipTransport,
{
    async fn forward(
        &self,
        payload: &Value,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
    ) -> ForwardReport {
        self.relay(payload, route, origin, hops).await
    }

    fn is_duplicate(&self, payload: &Value) -> bool {
        self.duplicates.seen_before(payload)
    }

    fn mark_seen(&self, payload: &Value) {
        self.duplicates.mark_seen(payload);
    }
}
