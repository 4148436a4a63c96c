//! # Node Credentials
//!
//! A node's identity is one Ed25519 keypair. Everything derived from it
//! (the hex public key attached to pings, the signing address peers key us
//! by) is computed once at construction and never changes.

use std::fmt;

use shared_types::SigningAddress;

use crate::signatures::{decode_fixed, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::CryptoError;

/// Keypair plus the identifiers derived from it.
pub struct Credentials {
    keypair: Ed25519KeyPair,
    pubkey_hex: String,
    address: SigningAddress,
}

impl Credentials {
    /// Fresh random identity.
    pub fn generate() -> Self {
        Self::from_keypair(Ed25519KeyPair::generate())
    }

    /// Deterministic identity from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Ed25519KeyPair::from_seed(seed))
    }

    /// Deterministic identity from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, CryptoError> {
        decode_fixed::<32>(seed_hex).map(Self::from_seed)
    }

    fn from_keypair(keypair: Ed25519KeyPair) -> Self {
        let public_key = keypair.public_key();
        Self {
            pubkey_hex: public_key.to_hex(),
            address: SigningAddress::from_public_key(public_key.as_bytes()),
            keypair,
        }
    }

    /// Hex-encoded public key.
    pub fn pubkey_hex(&self) -> &str {
        &self.pubkey_hex
    }

    /// Address this node signs under.
    pub fn signing_address(&self) -> &SigningAddress {
        &self.address
    }

    /// Sign `message`, returning the hex signature.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        self.keypair.sign(message).to_hex()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Verify a hex signature made by the holder of a hex public key.
pub fn verify_hex(pubkey_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), CryptoError> {
    let key = Ed25519PublicKey::from_hex(pubkey_hex)?;
    let signature = Ed25519Signature::from_hex(signature_hex)?;
    key.verify(message, &signature)
}
