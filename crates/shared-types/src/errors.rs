//! # Error Types
//!
//! Errors shared by every subsystem that talks to remote peers.

use thiserror::Error;

/// Failure of a single outbound request to a peer.
///
/// Timeouts and connection failures are the expected transport class; the
/// remaining variants cover everything a peer can answer that we did not
/// anticipate. Callers treat both classes alike for retry purposes but log
/// the unexpected ones louder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer did not answer within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The peer could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The peer answered with a status the caller does not handle.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The peer answered with a body we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Anything else raised while talking to the peer.
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true for the expected network failures (timeout, refused).
    pub fn is_transport(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connection(_))
    }
}

/// A peer address that cannot be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Nothing but whitespace was supplied.
    #[error("empty peer address")]
    Empty,

    /// The address has no usable host or an invalid port.
    #[error("malformed peer address: {0}")]
    Malformed(String),
}
