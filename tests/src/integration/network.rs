//! # In-Memory Network
//!
//! Nodes are reached through their axum routers without sockets, so the
//! full route layer runs while tests stay fast and deterministic. Each
//! request is stamped with the caller's address as `ConnectInfo`.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use cc_01_peer_discovery::{DiscoveryTransport, MutualAddReply};
use cc_02_gossip_propagation::GossipTransport;
use node_runtime::container::{NodeConfig, NodeContainer};
use node_runtime::handlers::router;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{
    HopCount, JoinRequest, PeerUrl, PeersResponse, SigningAddress, TransportError,
};
use tower::ServiceExt;

/// Routers addressable by peer URL.
#[derive(Default)]
pub struct MemoryNetwork {
    nodes: RwLock<HashMap<PeerUrl, Router>>,
    down: RwLock<HashSet<PeerUrl>>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attach(&self, url: PeerUrl, router: Router) {
        self.nodes.write().insert(url, router);
    }

    /// Make every request to `url` time out (or stop doing so).
    pub fn set_down(&self, url: &PeerUrl, down: bool) {
        let mut set = self.down.write();
        if down {
            set.insert(url.clone());
        } else {
            set.remove(url);
        }
    }

    async fn call(
        &self,
        caller: SocketAddr,
        peer: &PeerUrl,
        request: Request<Body>,
    ) -> Result<(StatusCode, Bytes), TransportError> {
        if self.down.read().contains(peer) {
            return Err(TransportError::Timeout);
        }
        let router = self
            .nodes
            .read()
            .get(peer)
            .cloned()
            .ok_or_else(|| TransportError::Connection(format!("no route to {peer}")))?;

        let response = router
            .layer(MockConnectInfo(caller))
            .oneshot(request)
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok((status, body))
    }
}

/// Transport of one node on a [`MemoryNetwork`].
pub struct MemoryTransport {
    network: Arc<MemoryNetwork>,
    caller: SocketAddr,
}

impl MemoryTransport {
    pub fn new(network: Arc<MemoryNetwork>, caller: SocketAddr) -> Self {
        Self { network, caller }
    }
}

fn json_request(uri: String, body: Vec<u8>) -> Result<Request<Body>, TransportError> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .map_err(|e| TransportError::Other(e.to_string()))
}

#[async_trait]
impl DiscoveryTransport for MemoryTransport {
    async fn request_mutual_add(
        &self,
        peer: &PeerUrl,
        request: &JoinRequest,
    ) -> Result<MutualAddReply, TransportError> {
        let body = serde_json::to_vec(request).map_err(|e| TransportError::Other(e.to_string()))?;
        let (status, body) = self
            .network
            .call(self.caller, peer, json_request("/mutual_add".into(), body)?)
            .await?;
        match status {
            StatusCode::CREATED => Ok(MutualAddReply::Accepted(SigningAddress::new(
                String::from_utf8_lossy(&body).trim(),
            ))),
            StatusCode::SERVICE_UNAVAILABLE => Ok(MutualAddReply::AtCapacity),
            other => Ok(MutualAddReply::Rejected(other.as_u16())),
        }
    }

    async fn fetch_peers(&self, peer: &PeerUrl) -> Result<Vec<String>, TransportError> {
        let request = Request::builder()
            .uri("/info/peers")
            .body(Body::empty())
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let (status, body) = self.network.call(self.caller, peer, request).await?;
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let peers: PeersResponse =
            serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(peers.peers)
    }
}

#[async_trait]
impl GossipTransport for MemoryTransport {
    async fn deliver(
        &self,
        peer: &PeerUrl,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
        payload: &Value,
    ) -> Result<(), TransportError> {
        let uri = format!("/forward/{route}?addr={origin}&redistribute={hops}");
        let body = serde_json::to_vec(payload).map_err(|e| TransportError::Other(e.to_string()))?;
        self.network
            .call(self.caller, peer, json_request(uri, body)?)
            .await?;
        Ok(())
    }
}

/// A node attached to a [`MemoryNetwork`] at `127.0.0.1:{port}`.
pub struct TestNode {
    pub port: u16,
    pub url: PeerUrl,
    pub container: NodeContainer<MemoryTransport>,
}

impl TestNode {
    /// Build, attach and report the listening port. The join worker does not
    /// start on its own; tests drive `join_network` and `maintenance_round`.
    pub fn spawn(network: &Arc<MemoryNetwork>, port: u16, config: NodeConfig) -> Self {
        let caller = SocketAddr::from(([127, 0, 0, 1], port));
        let url = PeerUrl::from_socket(caller);
        let transport = Arc::new(MemoryTransport::new(Arc::clone(network), caller));
        let container = NodeContainer::new(config, transport).expect("valid test config");

        network.attach(url.clone(), router(container.app_state()));
        container.discovery.set_port(port);
        Self {
            port,
            url,
            container,
        }
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.container.shutdown();
    }
}

/// Small, fast settings shared by multi-node tests.
pub fn test_config(seed_ports: &[u16]) -> NodeConfig {
    NodeConfig {
        seeds: seed_ports
            .iter()
            .map(|port| format!("http://127.0.0.1:{port}"))
            .collect(),
        min_peers: 2,
        pow_difficulty_bits: 4,
        tick_period: 0.0,
        tick_period_margin: 0.0,
        poll_interval: 0.01,
        port_timer_timeout: 3600.0,
        ..NodeConfig::default()
    }
}
