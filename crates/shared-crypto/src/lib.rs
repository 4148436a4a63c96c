//! # Shared Crypto
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Ping, tick and join-request signing |
//! | `credentials` | Ed25519 + SHA-256 | Node identity and signing address |
//! | `pow` | SHA-256 leading zero bits | Ping and tick mining |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Secret keys** are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod credentials;
pub mod errors;
pub mod pow;
pub mod signatures;

// Re-exports
pub use credentials::{verify_hex, Credentials};
pub use errors::CryptoError;
pub use pow::{ProofOfWork, Solution};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
