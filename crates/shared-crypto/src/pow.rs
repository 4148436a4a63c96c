//! # Proof of Work
//!
//! SHA-256 over the canonical body bytes, accepted when the digest starts
//! with at least `difficulty_bits` zero bits. The nonce is part of the body,
//! so the caller supplies an encoder that renders the body for a given nonce.

use sha2::{Digest, Sha256};

/// Largest difficulty accepted. Anything higher could never be mined.
pub const MAX_DIFFICULTY_BITS: u32 = 64;

/// A nonce and the digest it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// Winning nonce.
    pub nonce: u64,
    /// SHA-256 of the body encoded with `nonce`.
    pub digest: [u8; 32],
}

/// Leading-zero-bits proof of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty_bits: u32,
}

impl ProofOfWork {
    /// Create a miner/verifier for the given difficulty (clamped to
    /// [`MAX_DIFFICULTY_BITS`]).
    pub fn new(difficulty_bits: u32) -> Self {
        Self {
            difficulty_bits: difficulty_bits.min(MAX_DIFFICULTY_BITS),
        }
    }

    /// Required leading zero bits.
    pub fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    /// Digest of already-encoded body bytes.
    pub fn digest(encoded: &[u8]) -> [u8; 32] {
        Sha256::digest(encoded).into()
    }

    /// Whether `digest` satisfies the difficulty.
    pub fn meets_target(&self, digest: &[u8; 32]) -> bool {
        count_leading_zero_bits(digest) >= self.difficulty_bits
    }

    /// Check an encoded body, returning its digest when the work is sufficient.
    pub fn verify(&self, encoded: &[u8]) -> Option<[u8; 32]> {
        let digest = Self::digest(encoded);
        self.meets_target(&digest).then_some(digest)
    }

    /// Search nonces upward from zero until the encoded body meets the target.
    ///
    /// CPU-bound; async callers run it on a blocking thread.
    pub fn solve<F>(&self, mut encode: F) -> Option<Solution>
    where
        F: FnMut(u64) -> Vec<u8>,
    {
        (0..=u64::MAX).find_map(|nonce| {
            self.verify(&encode(nonce))
                .map(|digest| Solution { nonce, digest })
        })
    }
}

fn count_leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in bytes {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}
