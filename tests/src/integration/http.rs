//! # Two Nodes Over Real Sockets
//!
//! Binds two runtimes on loopback and drives them through the HTTP
//! transport end to end.

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;

    use node_runtime::container::NodeConfig;
    use node_runtime::NodeRuntime;
    use serde_json::Value;
    use shared_types::PeersResponse;

    fn loopback_config() -> NodeConfig {
        NodeConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            max_port_attempts: 1,
            min_peers: 1,
            pow_difficulty_bits: 4,
            port_timer_timeout: 3600.0,
            poll_interval: 0.05,
            tick_period_margin: 0.0,
            timeout: 1.0,
            ..NodeConfig::default()
        }
    }

    async fn chain_length(client: &reqwest::Client, addr: SocketAddr) -> u64 {
        let status: Value = client
            .get(format!("http://{addr}/info/clockchain"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        status["length"].as_u64().unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_nodes_join_and_share_ticks() {
        // A produces ticks quickly; B only ever pings.
        let a = NodeRuntime::new(NodeConfig {
            tick_period: 0.2,
            key_seed: Some("0a".repeat(32)),
            ..loopback_config()
        })
        .unwrap();
        let a_addr = a.start().await.unwrap();

        let b = NodeRuntime::new(NodeConfig {
            seeds: vec![format!("http://{a_addr}")],
            joiner_port_threshold: u16::MAX,
            tick_period: 3600.0,
            key_seed: Some("0b".repeat(32)),
            ..loopback_config()
        })
        .unwrap();
        let b_addr = b.start().await.unwrap();

        b.container().discovery.join_network().await;
        a.container().discovery.maintenance_round().await;
        b.container().discovery.maintenance_round().await;

        let client = reqwest::Client::new();
        let peers: PeersResponse = client
            .get(format!("http://{a_addr}/info/peers"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(peers.peers, vec![format!("http://{b_addr}")]);
        assert_eq!(b.container().registry.len(), 1);

        let reached = tokio::time::timeout(Duration::from_secs(20), async {
            while chain_length(&client, b_addr).await < 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "B never received a tick");

        // Every tick B holds came from A, in A's order.
        let b_ticks = b.container().chain.ticks();
        let a_ticks = a.container().chain.ticks();
        assert!(!b_ticks.is_empty());
        assert!(a_ticks.starts_with(&b_ticks));

        b.shutdown().await;
        a.shutdown().await;
    }
}
