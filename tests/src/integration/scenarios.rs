//! # End-to-End Scenarios
//!
//! One scenario per component, wired from the library crates with
//! hand-written ports in place of the network.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use cc_01_peer_discovery::PeerRegistry;
    use cc_02_gossip_propagation::{
        DuplicateCache, GossipApi, GossipConfig, GossipForwarder, GossipTransport,
    };
    use cc_03_round_production::{
        mine_ping, ArtifactBroadcaster, Clockchain, ReadinessProbe, RoundApi, RoundConfig,
        RoundSynchronizer,
    };
    use node_runtime::adapters::RegistryDirectory;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_crypto::{Credentials, ProofOfWork};
    use shared_types::{
        GossipRoute, HopCount, PeerUrl, SigningAddress, Sleeper, SystemTimeSource, TickRef,
        TimeSource, TransportError,
    };

    // =========================================================================
    // Ports
    // =========================================================================

    /// Per-peer scripted gossip transport; unscripted peers succeed.
    #[derive(Default)]
    struct ScriptedTransport {
        timeouts: Mutex<Vec<PeerUrl>>,
        calls: Mutex<HashMap<PeerUrl, usize>>,
    }

    impl ScriptedTransport {
        fn always_time_out(&self, peer: &PeerUrl) {
            self.timeouts.lock().push(peer.clone());
        }

        fn calls_to(&self, peer: &PeerUrl) -> usize {
            self.calls.lock().get(peer).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().values().sum()
        }
    }

    #[async_trait]
    impl GossipTransport for ScriptedTransport {
        async fn deliver(
            &self,
            peer: &PeerUrl,
            _route: &str,
            _origin: &SigningAddress,
            _hops: HopCount,
            _payload: &Value,
        ) -> Result<(), TransportError> {
            *self.calls.lock().entry(peer.clone()).or_default() += 1;
            if self.timeouts.lock().contains(peer) {
                Err(TransportError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct InstantSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().push(duration);
        }
    }

    struct AlwaysReady(AtomicBool);

    impl ReadinessProbe for AlwaysReady {
        fn is_ready(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CountingBroadcaster {
        sent: Mutex<usize>,
    }

    #[async_trait]
    impl ArtifactBroadcaster for CountingBroadcaster {
        async fn broadcast(&self, _route: GossipRoute, _payload: Value) {
            *self.sent.lock() += 1;
        }
    }

    fn url(raw: &str) -> PeerUrl {
        PeerUrl::parse(raw).unwrap()
    }

    fn forwarder(
        max_hops: i64,
        registry: &Arc<PeerRegistry>,
        transport: &Arc<ScriptedTransport>,
        sleeper: &Arc<InstantSleeper>,
    ) -> GossipForwarder<RegistryDirectory, ScriptedTransport> {
        let config = GossipConfig {
            max_hops,
            ..GossipConfig::default()
        };
        GossipForwarder::new(
            config,
            SigningAddress::new("addrA"),
            Arc::new(DuplicateCache::new(100, 60, Arc::new(SystemTimeSource))),
            Arc::new(RegistryDirectory::new(Arc::clone(registry))),
            Arc::clone(transport),
            sleeper.clone(),
        )
    }

    fn synchronizer(
        broadcaster: Arc<CountingBroadcaster>,
    ) -> RoundSynchronizer<AlwaysReady, CountingBroadcaster> {
        RoundSynchronizer::new(
            RoundConfig::for_testing(),
            Arc::new(Clockchain::new()),
            Arc::new(Credentials::from_seed([6; 32])),
            Arc::new(AlwaysReady(AtomicBool::new(true))),
            broadcaster,
            Arc::new(SystemTimeSource),
            Arc::new(InstantSleeper::default()),
        )
    }

    // =========================================================================
    // Scenario 1: registration into an empty registry
    // =========================================================================

    #[test]
    fn test_scenario_register_into_empty_registry() {
        let registry = PeerRegistry::new(SigningAddress::new("addrA"), 10);
        assert!(registry.is_empty());

        assert!(registry.register("http://10.0.0.2:5000", SigningAddress::new("addrB")));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, url("http://10.0.0.2:5000"));
        assert_eq!(snapshot[0].signing_address, SigningAddress::new("addrB"));
    }

    // =========================================================================
    // Scenario 2: same signer pooled twice in one round
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_second_ping_overwrites_first() {
        let rounds = synchronizer(Arc::new(CountingBroadcaster::default()));
        let remote = Credentials::from_seed([5; 32]);
        let pow = ProofOfWork::new(RoundConfig::for_testing().pow_difficulty_bits);
        let now = SystemTimeSource.now_secs();
        let first = mine_ping(&remote, &pow, now, TickRef::genesis()).unwrap();
        let second = mine_ping(&remote, &pow, now.saturating_sub(1), TickRef::genesis()).unwrap();

        rounds.receive_ping(first).await.unwrap();
        let signer = rounds.receive_ping(second.clone()).await.unwrap();

        assert_eq!(&signer, remote.signing_address());
        assert_eq!(rounds.chain().pool_len(), 1);
        assert_eq!(rounds.chain().pool_snapshot(), vec![second]);
    }

    // =========================================================================
    // Scenario 3: hop count at the limit
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_hop_limit_makes_no_calls() {
        let registry = Arc::new(PeerRegistry::new(SigningAddress::new("addrA"), 10));
        registry.register("http://10.0.0.2:5000", SigningAddress::new("addrB"));
        let transport = Arc::new(ScriptedTransport::default());
        let sleeper = Arc::new(InstantSleeper::default());
        let gossip = forwarder(1, &registry, &transport, &sleeper);

        let report = gossip
            .forward(&json!({"p": 1}), "ping", &SigningAddress::new("addrC"), HopCount::new(1))
            .await;

        assert!(!report.relayed());
        assert_eq!(transport.total_calls(), 0);
    }

    // =========================================================================
    // Scenario 4: a destination timing out on every attempt
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_timing_out_peer_evicted_after_four_attempts() {
        let registry = Arc::new(PeerRegistry::new(SigningAddress::new("addrA"), 10));
        registry.register("http://10.0.0.2:5000", SigningAddress::new("addrB"));
        registry.register("http://10.0.0.3:5000", SigningAddress::new("addrC"));
        let dead = url("http://10.0.0.2:5000");
        let alive = url("http://10.0.0.3:5000");

        let transport = Arc::new(ScriptedTransport::default());
        transport.always_time_out(&dead);
        let sleeper = Arc::new(InstantSleeper::default());
        let gossip = forwarder(1, &registry, &transport, &sleeper);

        let report = gossip
            .forward(&json!({"p": 1}), "tick", &SigningAddress::new("addrA"), HopCount::ORIGIN)
            .await;

        assert_eq!(transport.calls_to(&dead), 4);
        assert_eq!(transport.calls_to(&alive), 1);
        assert_eq!(report.evicted, vec![dead.clone()]);
        assert_eq!(report.delivered, 1);
        assert!(!registry.contains(&dead));
        assert!(registry.contains(&alive));
        assert_eq!(
            *sleeper.slept.lock(),
            vec![Duration::from_millis(500); 3]
        );

        // The evicted peer is gone from the next snapshot too.
        gossip
            .forward(&json!({"p": 2}), "tick", &SigningAddress::new("addrA"), HopCount::ORIGIN)
            .await;
        assert_eq!(transport.calls_to(&dead), 4);
    }

    // =========================================================================
    // Scenario 5: tick step with an empty pool
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_empty_pool_tick_does_not_mine_or_append() {
        let broadcaster = Arc::new(CountingBroadcaster::default());
        let rounds = synchronizer(Arc::clone(&broadcaster));

        // Round bookkeeping says our ping is in, but the pool is empty.
        rounds.state().ping_added(0);

        assert_eq!(rounds.try_produce_tick().await.unwrap(), None);
        assert_eq!(rounds.chain().height(), 0);
        assert_eq!(*broadcaster.sent.lock(), 0);
    }
}
