//! Error types for gossip propagation.

use shared_types::{PeerUrl, TransportError};
use thiserror::Error;

/// Errors raised while relaying a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GossipError {
    /// Every attempt to reach a destination failed.
    #[error("delivery to {peer} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        peer: PeerUrl,
        attempts: u32,
        last: TransportError,
    },
}
