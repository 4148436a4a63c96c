//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: [`SigningAddress`], [`PeerUrl`], [`PeerEntry`]
//! - **Chain**: [`Ping`], [`Tick`], [`TickRef`]
//! - **Membership**: [`JoinRequest`], [`PeersResponse`]
//! - **Gossip**: [`HopCount`], [`GossipRoute`]

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::{canonical_bytes, sha256};
use crate::errors::AddressError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Number of digest bytes kept when deriving a signing address.
pub const SIGNING_ADDRESS_LEN: usize = 20;

/// Hex identifier derived from a node's public key.
///
/// This is the identity a node signs under; peers are deduplicated on the
/// network address but self-detection and origin exclusion use this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningAddress(String);

impl SigningAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Derive the address from raw public key bytes.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = sha256(public_key);
        Self(hex::encode(&digest[..SIGNING_ADDRESS_LEN]))
    }

    /// Derive the address from a hex-encoded public key.
    pub fn from_public_key_hex(pubkey_hex: &str) -> Option<Self> {
        hex::decode(pubkey_hex)
            .ok()
            .map(|bytes| Self::from_public_key(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SigningAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical network address of a peer: `http://host:port`.
///
/// Any scheme, path, query, fragment or userinfo in the input is dropped and
/// the host is lower-cased, so `HTTP://Node-A:5000/` and `node-a:5000` name
/// the same peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerUrl(String);

impl PeerUrl {
    /// Canonicalize a raw address.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let rest = match trimmed.find("://") {
            Some(idx) => &trimmed[idx + 3..],
            None => trimmed,
        };
        let end = rest
            .find(|c: char| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let authority = &rest[..end];
        let host_port = authority.rsplit('@').next().unwrap_or(authority);

        if host_port.is_empty() || host_port.contains(char::is_whitespace) {
            return Err(AddressError::Malformed(raw.to_string()));
        }
        validate_port(host_port).map_err(|_| AddressError::Malformed(raw.to_string()))?;

        Ok(Self(format!("http://{}", host_port.to_ascii_lowercase())))
    }

    /// Address a peer by the socket it connected from and the port it listens on.
    pub fn from_socket(addr: SocketAddr) -> Self {
        Self(format!("http://{addr}"))
    }

    /// Full URL of an endpoint on this peer.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_port(host_port: &str) -> Result<(), ()> {
    let port = if host_port.starts_with('[') {
        let close = host_port.find(']').ok_or(())?;
        match &host_port[close + 1..] {
            "" => None,
            tail => Some(tail.strip_prefix(':').ok_or(())?),
        }
    } else {
        host_port.rsplit_once(':').map(|(_, port)| port)
    };

    match port {
        Some(port) => port.parse::<u16>().map(|_| ()).map_err(|_| ()),
        None => Ok(()),
    }
}

impl fmt::Display for PeerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerUrl {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeerUrl {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeerUrl> for String {
    fn from(url: PeerUrl) -> Self {
        url.0
    }
}

/// One row of the peer registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub url: PeerUrl,
    pub signing_address: SigningAddress,
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Hex digest naming a tick, or the fixed genesis reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickRef(String);

impl TickRef {
    const GENESIS_SEED: &'static [u8] = b"clockchain-genesis";

    /// Reference used as the head of an empty chain.
    pub fn genesis() -> Self {
        Self::from_digest(&sha256(Self::GENESIS_SEED))
    }

    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn new(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed, proof-of-work-gated attestation that a node is live in the
/// current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    /// Hex-encoded Ed25519 public key of the producer.
    pub pubkey: String,
    /// Unix seconds at construction.
    pub timestamp: u64,
    /// Head of the chain the ping was built against.
    pub reference: TickRef,
    pub nonce: u64,
    /// Hex-encoded signature over [`PingBody`].
    pub signature: String,
}

/// The signed and mined portion of a [`Ping`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PingBody<'a> {
    pub pubkey: &'a str,
    pub timestamp: u64,
    pub reference: &'a TickRef,
    pub nonce: u64,
}

impl PingBody<'_> {
    pub fn encode(&self) -> Vec<u8> {
        canonical_bytes(self)
    }
}

impl Ping {
    pub fn body(&self) -> PingBody<'_> {
        PingBody {
            pubkey: &self.pubkey,
            timestamp: self.timestamp,
            reference: &self.reference,
            nonce: self.nonce,
        }
    }

    /// Address of the node that produced this ping, if the key decodes.
    pub fn signer(&self) -> Option<SigningAddress> {
        SigningAddress::from_public_key_hex(&self.pubkey)
    }
}

/// A round-closing record bundling the pings collected in that round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub list: Vec<Ping>,
    pub pubkey: String,
    pub prev_tick: TickRef,
    pub nonce: u64,
    pub signature: String,
    /// Proof-of-work digest of [`TickBody`]; becomes the next head.
    pub this_tick: TickRef,
}

/// The signed and mined portion of a [`Tick`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickBody<'a> {
    pub list: &'a [Ping],
    pub pubkey: &'a str,
    pub prev_tick: &'a TickRef,
    pub nonce: u64,
}

impl TickBody<'_> {
    pub fn encode(&self) -> Vec<u8> {
        canonical_bytes(self)
    }
}

impl Tick {
    pub fn body(&self) -> TickBody<'_> {
        TickBody {
            list: &self.list,
            pubkey: &self.pubkey,
            prev_tick: &self.prev_tick,
            nonce: self.nonce,
        }
    }

    pub fn signer(&self) -> Option<SigningAddress> {
        SigningAddress::from_public_key_hex(&self.pubkey)
    }
}

// =============================================================================
// CLUSTER C: MEMBERSHIP
// =============================================================================

/// Signed request asking a remote node to add us as a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Port the requester listens on.
    pub port: u16,
    pub pubkey: String,
    pub signature: String,
}

/// The signed portion of a [`JoinRequest`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JoinBody<'a> {
    pub port: u16,
    pub pubkey: &'a str,
}

impl JoinBody<'_> {
    pub fn encode(&self) -> Vec<u8> {
        canonical_bytes(self)
    }
}

impl JoinRequest {
    pub fn body(&self) -> JoinBody<'_> {
        JoinBody {
            port: self.port,
            pubkey: &self.pubkey,
        }
    }
}

/// Body of `GET /info/peers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

// =============================================================================
// CLUSTER D: GOSSIP
// =============================================================================

/// Relay counter carried on the wire as `redistribute`.
///
/// `-1` means "deliver but never relay"; any other value is the number of
/// hops the payload has already travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HopCount(i64);

impl HopCount {
    pub const NO_FORWARD: HopCount = HopCount(-1);
    pub const ORIGIN: HopCount = HopCount(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_no_forward(self) -> bool {
        self.0 == Self::NO_FORWARD.0
    }

    /// The count to attach when relaying, or `None` if the hop limit is spent.
    pub fn next_within(self, max_hops: i64) -> Option<HopCount> {
        if self.is_no_forward() || self.0 >= max_hops {
            None
        } else {
            Some(HopCount(self.0 + 1))
        }
    }
}

impl fmt::Display for HopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named gossip routes understood by the forward endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GossipRoute {
    Ping,
    Tick,
}

impl GossipRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            GossipRoute::Ping => "ping",
            GossipRoute::Tick => "tick",
        }
    }
}

impl fmt::Display for GossipRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GossipRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping" => Ok(GossipRoute::Ping),
            "tick" => Ok(GossipRoute::Tick),
            other => Err(format!("unknown gossip route: {other}")),
        }
    }
}
