//! Error types for round production

use thiserror::Error;

use crate::domain::ValidationError;

/// Result type alias for round production operations
pub type Result<T> = std::result::Result<T, RoundError>;

/// Errors that can occur while producing or accepting round artifacts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// A ping (own or gossiped) failed validation
    #[error("Ping rejected: {0}")]
    PingRejected(ValidationError),

    /// A tick (own or gossiped) failed validation
    #[error("Tick rejected: {0}")]
    TickRejected(ValidationError),

    /// Nonce space searched without meeting the difficulty
    #[error("Mining failed: no valid nonce found")]
    MiningExhausted,

    /// The blocking mining task panicked or was cancelled
    #[error("Mining task failed: {0}")]
    MiningTask(String),

    /// Artifact could not be rendered for gossip
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RoundError {
    /// Whether the loop that hit this error should simply try again next round.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RoundError::PingRejected(_) | RoundError::TickRejected(_)
        )
    }
}
