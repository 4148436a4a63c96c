//! # Three-Node Cluster
//!
//! Two seeds (5000, 5001) and one joiner (5003) discover each other, become
//! ready, exchange pings and close a round with one tick that every node
//! appends.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cc_01_peer_discovery::PeerDiscoveryApi;
    use cc_03_round_production::RoundStage;
    use shared_types::PeerUrl;

    use crate::integration::network::{test_config, MemoryNetwork, TestNode};

    async fn joined_cluster() -> (std::sync::Arc<MemoryNetwork>, Vec<TestNode>) {
        let network = MemoryNetwork::new();
        let seeds = [5000, 5001];
        let nodes: Vec<TestNode> = [5000, 5001, 5003]
            .into_iter()
            .map(|port| TestNode::spawn(&network, port, test_config(&seeds)))
            .collect();

        for node in &nodes {
            node.container.discovery.join_network().await;
        }
        for node in &nodes {
            node.container.discovery.maintenance_round().await;
        }
        (network, nodes)
    }

    fn peer_set(node: &TestNode) -> BTreeSet<PeerUrl> {
        node.container.registry.urls().into_iter().collect()
    }

    #[tokio::test]
    async fn test_seeds_and_joiner_form_full_mesh() {
        let (_network, nodes) = joined_cluster().await;

        for node in &nodes {
            let expected: BTreeSet<PeerUrl> = nodes
                .iter()
                .filter(|other| other.port != node.port)
                .map(|other| other.url.clone())
                .collect();
            assert_eq!(peer_set(node), expected, "peers of {}", node.url);
            assert!(node.container.discovery.is_ready());
        }
    }

    #[tokio::test]
    async fn test_registry_maps_urls_to_remote_identities() {
        let (_network, nodes) = joined_cluster().await;

        for entry in nodes[2].container.registry.snapshot() {
            let owner = nodes
                .iter()
                .find(|node| node.url == entry.url)
                .expect("registered url belongs to a node");
            assert_eq!(
                &entry.signing_address,
                owner.container.credentials.signing_address()
            );
        }
    }

    #[tokio::test]
    async fn test_round_closes_with_one_tick_everywhere() {
        let (_network, nodes) = joined_cluster().await;

        for node in &nodes {
            let ping = node.container.rounds.try_produce_ping().await.unwrap();
            assert!(ping.is_some(), "{} did not ping", node.url);
        }
        for node in &nodes {
            assert_eq!(node.container.chain.pool_len(), 3, "pool of {}", node.url);
        }

        let tick = nodes[1]
            .container
            .rounds
            .try_produce_tick()
            .await
            .unwrap()
            .expect("tick produced");
        assert_eq!(tick.list.len(), 3);

        for node in &nodes {
            assert_eq!(node.container.chain.height(), 1);
            assert_eq!(node.container.chain.head(), tick.this_tick);
            assert_eq!(node.container.chain.pool_len(), 0);
            assert_eq!(
                node.container.rounds.state().stage(),
                RoundStage::CollectingPing
            );
        }

        // Round already closed by the tick above.
        assert_eq!(nodes[0].container.rounds.try_produce_tick().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_evicted_by_gossip() {
        let (network, nodes) = joined_cluster().await;
        network.set_down(&nodes[2].url, true);

        nodes[0].container.rounds.try_produce_ping().await.unwrap();

        assert!(!nodes[0].container.registry.contains(&nodes[2].url));
        assert!(nodes[0].container.registry.contains(&nodes[1].url));
        assert_eq!(nodes[1].container.chain.pool_len(), 1);
    }

    #[tokio::test]
    async fn test_not_ready_node_does_not_ping() {
        let network = MemoryNetwork::new();
        let lonely = TestNode::spawn(&network, 5003, test_config(&[5000]));

        lonely.container.discovery.join_network().await;
        lonely.container.discovery.maintenance_round().await;

        assert!(!lonely.container.discovery.is_ready());
        assert_eq!(lonely.container.rounds.try_produce_ping().await.unwrap(), None);
    }
}
