//! # Canonical Encoding
//!
//! Every digest in the system is taken over the same byte representation:
//! compact `serde_json` output. Body structs serialize their fields in
//! declaration order and `serde_json::Value` objects are key-sorted, so the
//! bytes are stable across nodes.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of a payload's canonical encoding.
pub type Fingerprint = [u8; 32];

/// Serialize `value` into its canonical byte form.
///
/// Records in this crate contain only strings, integers and sequences, for
/// which `serde_json` serialization cannot fail; an empty buffer is returned
/// if a caller ever passes something that does.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// SHA-256 over raw bytes.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Fingerprint used by duplicate suppression.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Fingerprint {
    sha256(&canonical_bytes(value))
}
