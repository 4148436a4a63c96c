//! # HTTP Transport
//!
//! Outbound side of the peer protocol over reqwest. Every request carries the
//! client-wide timeout.
//!
//! | Call | Request | Outcome |
//! |------|---------|---------|
//! | `request_mutual_add` | `POST {peer}/mutual_add` | 201 body = remote signing address, 503 = at capacity |
//! | `fetch_peers` | `GET {peer}/info/peers` | `{"peers": [...]}` |
//! | `deliver` | `POST {peer}/forward/{route}?addr=..&redistribute=..` | any response counts as delivered |

use std::time::Duration;

use async_trait::async_trait;
use cc_01_peer_discovery::{DiscoveryTransport, MutualAddReply};
use cc_02_gossip_propagation::GossipTransport;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared_types::{
    HopCount, JoinRequest, PeerUrl, PeersResponse, SigningAddress, TransportError,
};

/// reqwest-backed transport shared by discovery and gossip.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        // Builder only fails on TLS backend setup; fall back to defaults.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connection(error.to_string())
    } else if error.is_decode() {
        TransportError::Decode(error.to_string())
    } else if let Some(status) = error.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl DiscoveryTransport for HttpTransport {
    async fn request_mutual_add(
        &self,
        peer: &PeerUrl,
        request: &JoinRequest,
    ) -> Result<MutualAddReply, TransportError> {
        let response = self
            .client
            .post(peer.endpoint("mutual_add"))
            .json(request)
            .send()
            .await
            .map_err(map_error)?;

        match response.status() {
            StatusCode::CREATED => {
                let body = response.text().await.map_err(map_error)?;
                let address = body.trim().trim_matches('"');
                if address.is_empty() {
                    return Err(TransportError::Decode(
                        "empty signing address in mutual_add reply".into(),
                    ));
                }
                Ok(MutualAddReply::Accepted(SigningAddress::new(address)))
            }
            StatusCode::SERVICE_UNAVAILABLE => Ok(MutualAddReply::AtCapacity),
            status => Ok(MutualAddReply::Rejected(status.as_u16())),
        }
    }

    async fn fetch_peers(&self, peer: &PeerUrl) -> Result<Vec<String>, TransportError> {
        let response = self
            .client
            .get(peer.endpoint("info/peers"))
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body: PeersResponse = response.json().await.map_err(map_error)?;
        Ok(body.peers)
    }
}

#[async_trait]
impl GossipTransport for HttpTransport {
    async fn deliver(
        &self,
        peer: &PeerUrl,
        route: &str,
        origin: &SigningAddress,
        hops: HopCount,
        payload: &Value,
    ) -> Result<(), TransportError> {
        self.client
            .post(peer.endpoint(&format!("forward/{route}")))
            .query(&[
                ("addr", origin.as_str().to_string()),
                ("redistribute", hops.value().to_string()),
            ])
            .json(payload)
            .send()
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
