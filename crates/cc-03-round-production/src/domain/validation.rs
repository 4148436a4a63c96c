//! # Artifact Validation
//!
//! A ping is valid when its key parses, its signature verifies over the
//! canonical body, its digest meets the difficulty, it references the head,
//! its timestamp is within tolerance and (for gossip) its signer has no ping
//! pooled yet.
//!
//! A tick is valid when it carries at least one ping, links to the head,
//! verifies and meets the difficulty, its `this_tick` is its own digest, and
//! every bundled ping is signed, worked and references `prev_tick` with no
//! signer repeated. Bundled timestamps are not rechecked; the tick arrives a
//! full period after them.

use std::collections::BTreeSet;

use shared_crypto::{verify_hex, ProofOfWork};
use shared_types::{Ping, SigningAddress, Tick, TickRef};
use thiserror::Error;

use super::clockchain::PingPool;

/// Why a ping or tick was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("public key is not a valid Ed25519 key")]
    MalformedKey,

    #[error("signature does not verify")]
    BadSignature,

    #[error("digest does not meet the difficulty target")]
    InsufficientWork,

    #[error("references {found}, head is {expected}")]
    StaleReference { expected: TickRef, found: TickRef },

    #[error("timestamp {timestamp} is more than {tolerance}s from local time {now}")]
    TimestampOutOfRange {
        timestamp: u64,
        now: u64,
        tolerance: u64,
    },

    #[error("signer {0} already has a ping in the pool")]
    AlreadyPooled(SigningAddress),

    #[error("tick bundles no pings")]
    EmptyTick,

    #[error("this_tick does not match the tick digest")]
    IdentifierMismatch,

    #[error("signer {0} appears twice in one tick")]
    DuplicateSigner(SigningAddress),

    #[error("bundled ping {index} invalid: {reason}")]
    BundledPing {
        index: usize,
        reason: Box<ValidationError>,
    },
}

/// Stateless checks parameterised by difficulty and clock tolerance.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    pow: ProofOfWork,
    clock_tolerance_secs: u64,
}

impl Validator {
    pub fn new(pow: ProofOfWork, clock_tolerance_secs: u64) -> Self {
        Self {
            pow,
            clock_tolerance_secs,
        }
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    /// Full check of a standalone ping. Pass `pool` to reject a second ping
    /// from a signer already pooled this round.
    pub fn validate_ping(
        &self,
        ping: &Ping,
        head: &TickRef,
        now: u64,
        pool: Option<&PingPool>,
    ) -> Result<SigningAddress, ValidationError> {
        let signer = self.check_signed_work(ping)?;

        if ping.reference != *head {
            return Err(ValidationError::StaleReference {
                expected: head.clone(),
                found: ping.reference.clone(),
            });
        }

        if now.abs_diff(ping.timestamp) > self.clock_tolerance_secs {
            return Err(ValidationError::TimestampOutOfRange {
                timestamp: ping.timestamp,
                now,
                tolerance: self.clock_tolerance_secs,
            });
        }

        if let Some(pool) = pool {
            if pool.contains_key(&signer) {
                return Err(ValidationError::AlreadyPooled(signer));
            }
        }

        Ok(signer)
    }

    /// Full check of a tick against the head it must extend.
    pub fn validate_tick(&self, tick: &Tick, head: &TickRef) -> Result<SigningAddress, ValidationError> {
        let signer = tick.signer().ok_or(ValidationError::MalformedKey)?;

        if tick.list.is_empty() {
            return Err(ValidationError::EmptyTick);
        }

        if tick.prev_tick != *head {
            return Err(ValidationError::StaleReference {
                expected: head.clone(),
                found: tick.prev_tick.clone(),
            });
        }

        let body = tick.body().encode();
        verify_hex(&tick.pubkey, &body, &tick.signature)
            .map_err(|_| ValidationError::BadSignature)?;
        let digest = self
            .pow
            .verify(&body)
            .ok_or(ValidationError::InsufficientWork)?;
        if TickRef::from_digest(&digest) != tick.this_tick {
            return Err(ValidationError::IdentifierMismatch);
        }

        let mut signers = BTreeSet::new();
        for (index, ping) in tick.list.iter().enumerate() {
            let bundled = |reason| ValidationError::BundledPing {
                index,
                reason: Box::new(reason),
            };
            let ping_signer = self.check_signed_work(ping).map_err(bundled)?;
            if ping.reference != tick.prev_tick {
                return Err(bundled(ValidationError::StaleReference {
                    expected: tick.prev_tick.clone(),
                    found: ping.reference.clone(),
                }));
            }
            if !signers.insert(ping_signer.clone()) {
                return Err(ValidationError::DuplicateSigner(ping_signer));
            }
        }

        Ok(signer)
    }

    fn check_signed_work(&self, ping: &Ping) -> Result<SigningAddress, ValidationError> {
        let signer = ping.signer().ok_or(ValidationError::MalformedKey)?;
        let body = ping.body().encode();
        verify_hex(&ping.pubkey, &body, &ping.signature)
            .map_err(|_| ValidationError::BadSignature)?;
        self.pow
            .verify(&body)
            .ok_or(ValidationError::InsufficientWork)?;
        Ok(signer)
    }
}
