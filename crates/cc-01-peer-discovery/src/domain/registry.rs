//! # Peer Registry
//!
//! Canonical peer address → signing address of that peer.
//!
//! ## Invariants
//!
//! - No entry carries the local signing address.
//! - Keys are unique canonical addresses.
//! - Size never exceeds `max_peers`.
//!
//! All checks and the insert happen under one write lock, so concurrent
//! registrations cannot jointly overshoot capacity or slip in a duplicate.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use shared_types::{PeerEntry, PeerUrl, SigningAddress};

use super::errors::RegistryError;

/// Thread-safe peer table.
#[derive(Debug)]
pub struct PeerRegistry {
    local_address: SigningAddress,
    max_peers: usize,
    peers: RwLock<BTreeMap<PeerUrl, SigningAddress>>,
}

impl PeerRegistry {
    pub fn new(local_address: SigningAddress, max_peers: usize) -> Self {
        Self {
            local_address,
            max_peers,
            peers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a peer, reporting why when it is refused.
    pub fn try_register(
        &self,
        address: &str,
        signing_address: SigningAddress,
    ) -> Result<PeerUrl, RegistryError> {
        let url = PeerUrl::parse(address)?;
        if signing_address == self.local_address {
            return Err(RegistryError::SelfRegistration);
        }

        let mut peers = self.peers.write();
        if peers.contains_key(&url) {
            return Err(RegistryError::AlreadyRegistered);
        }
        if peers.len() >= self.max_peers {
            return Err(RegistryError::AtCapacity);
        }
        peers.insert(url.clone(), signing_address);
        Ok(url)
    }

    /// Register a peer. Returns false, leaving the table untouched, when the
    /// peer is ourselves, already known, unparseable, or the table is full.
    pub fn register(&self, address: &str, signing_address: SigningAddress) -> bool {
        self.try_register(address, signing_address).is_ok()
    }

    /// Remove a peer. Unknown or unparseable addresses are a no-op.
    pub fn unregister(&self, address: &str) -> bool {
        match PeerUrl::parse(address) {
            Ok(url) => self.unregister_url(&url),
            Err(_) => false,
        }
    }

    pub fn unregister_url(&self, url: &PeerUrl) -> bool {
        self.peers.write().remove(url).is_some()
    }

    /// Point-in-time copy of the table.
    pub fn snapshot(&self) -> Vec<PeerEntry> {
        self.peers
            .read()
            .iter()
            .map(|(url, signing_address)| PeerEntry {
                url: url.clone(),
                signing_address: signing_address.clone(),
            })
            .collect()
    }

    pub fn urls(&self) -> Vec<PeerUrl> {
        self.peers.read().keys().cloned().collect()
    }

    pub fn contains(&self, url: &PeerUrl) -> bool {
        self.peers.read().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.max_peers
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    pub fn local_address(&self) -> &SigningAddress {
        &self.local_address
    }
}
