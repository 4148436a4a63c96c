//! Inbound ports (API) for round production.

use async_trait::async_trait;
use serde::Serialize;
use shared_types::{Ping, SigningAddress, Tick, TickRef};

use crate::error::Result;

/// Summary of chain and round state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundStatus {
    pub length: usize,
    pub head: TickRef,
    pub pool_size: usize,
    pub stage: &'static str,
}

/// Entry points for artifacts arriving over gossip.
#[async_trait]
pub trait RoundApi: Send + Sync {
    /// Validate and pool a gossiped ping, replacing any earlier ping from
    /// the same signer. Returns its signer.
    async fn receive_ping(&self, ping: Ping) -> Result<SigningAddress>;

    /// Validate and append a gossiped tick, closing the round. Returns the
    /// new chain length.
    async fn receive_tick(&self, tick: Tick) -> Result<usize>;

    fn status(&self) -> RoundStatus;
}
