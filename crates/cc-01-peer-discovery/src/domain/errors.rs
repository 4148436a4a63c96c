//! Domain errors for peer discovery.

use std::fmt;

use shared_types::AddressError;

/// Why a registration was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The address could not be canonicalized.
    InvalidAddress(AddressError),
    /// The signing address is our own.
    SelfRegistration,
    /// The canonical address is already in the table.
    AlreadyRegistered,
    /// The table holds `max_peers` entries.
    AtCapacity,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(e) => write!(f, "Invalid peer address: {e}"),
            Self::SelfRegistration => write!(f, "Refusing to register the local node"),
            Self::AlreadyRegistered => write!(f, "Peer already registered"),
            Self::AtCapacity => write!(f, "Peer table at capacity"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<AddressError> for RegistryError {
    fn from(e: AddressError) -> Self {
        Self::InvalidAddress(e)
    }
}

/// Outcome of an inbound join request that did not end in registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// Signature or public key did not verify.
    InvalidSignature,
    /// The requester is this node.
    SelfJoin,
    /// The peer table is full.
    AtCapacity,
    /// The requester's address could not be formed.
    InvalidAddress(AddressError),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "Join request signature invalid"),
            Self::SelfJoin => write!(f, "Join request came from the local node"),
            Self::AtCapacity => write!(f, "At peer-maximum"),
            Self::InvalidAddress(e) => write!(f, "Invalid requester address: {e}"),
        }
    }
}

impl std::error::Error for DiscoveryError {}
