//! # Round Synchronizer
//!
//! Drives the two round loops and accepts gossiped artifacts.
//!
//! ## Ping loop
//!
//! While ready and no own ping is pooled: mine a ping on the current head
//! (blocking thread), pool it if it still validates, mark the stage
//! `CollectingTick` and broadcast it.
//!
//! ## Tick loop
//!
//! While ready and an own ping is pooled: wait `tick_period +
//! tick_period_margin`. If the chain grew meanwhile the round was closed by
//! someone else's tick and this attempt is dropped. Otherwise bundle the
//! pool, mine and sign a tick, commit it if the head has not moved, close the
//! round and broadcast the tick.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use shared_crypto::{Credentials, ProofOfWork};
use shared_types::{GossipRoute, Ping, SigningAddress, Sleeper, Tick, TimeSource};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RoundConfig;
use crate::domain::{mine_ping, mine_tick, Clockchain, RoundState, Validator};
use crate::error::{Result, RoundError};
use crate::ports::inbound::{RoundApi, RoundStatus};
use crate::ports::outbound::{ArtifactBroadcaster, ReadinessProbe};

#[cfg(test)]
mod tests;

/// Round production service.
///
/// Generic over its outbound ports:
/// - `R: ReadinessProbe` - gate on peer connectivity
/// - `B: ArtifactBroadcaster` - gossip of own artifacts
pub struct RoundSynchronizer<R, B>
where
    R: ReadinessProbe,
    B: ArtifactBroadcaster,
{
    config: RoundConfig,
    chain: Arc<Clockchain>,
    state: RoundState,
    validator: Validator,
    credentials: Arc<Credentials>,
    readiness: Arc<R>,
    broadcaster: Arc<B>,
    clock: Arc<dyn TimeSource>,
    sleeper: Arc<dyn Sleeper>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl<R, B> RoundSynchronizer<R, B>
where
    R: ReadinessProbe + 'static,
    B: ArtifactBroadcaster + 'static,
{
    pub fn new(
        config: RoundConfig,
        chain: Arc<Clockchain>,
        credentials: Arc<Credentials>,
        readiness: Arc<R>,
        broadcaster: Arc<B>,
        clock: Arc<dyn TimeSource>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let validator = Validator::new(
            ProofOfWork::new(config.pow_difficulty_bits),
            config.ping_clock_tolerance_secs,
        );
        Self {
            config,
            chain,
            state: RoundState::new(),
            validator,
            credentials,
            readiness,
            broadcaster,
            clock,
            sleeper,
            loops: Mutex::new(Vec::new()),
        }
    }

    pub fn chain(&self) -> &Arc<Clockchain> {
        &self.chain
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// One pass of the ping loop.
    ///
    /// `Ok(None)` when not ready or an own ping is already pooled.
    pub async fn try_produce_ping(&self) -> Result<Option<Ping>> {
        if !self.readiness.is_ready() || self.state.added_ping() {
            return Ok(None);
        }

        let reference = self.chain.head();
        let timestamp = self.clock.now_secs();
        let credentials = Arc::clone(&self.credentials);
        let pow = self.validator.pow();
        let ping = tokio::task::spawn_blocking(move || {
            mine_ping(&credentials, &pow, timestamp, reference)
        })
        .await
        .map_err(|e| RoundError::MiningTask(e.to_string()))??;

        let now = self.clock.now_secs();
        let (_, height) = self
            .chain
            .admit_ping(ping.clone(), |ping, head, pool| {
                self.validator.validate_ping(ping, head, now, Some(pool))
            })
            .map_err(RoundError::PingRejected)?;
        self.state.ping_added(height);

        info!(
            "[cc-03] Ping added for round at height {} (nonce {})",
            height, ping.nonce
        );
        self.broadcast(GossipRoute::Ping, &ping).await?;
        Ok(Some(ping))
    }

    /// One pass of the tick loop.
    ///
    /// `Ok(None)` when not ready, no own ping is pooled, or the round was
    /// closed elsewhere during the wait.
    pub async fn try_produce_tick(&self) -> Result<Option<Tick>> {
        if !self.readiness.is_ready() {
            return Ok(None);
        }
        let Some(since_height) = self.state.collecting_tick_since() else {
            return Ok(None);
        };

        self.sleeper.sleep(self.config.tick_wait()).await;

        if self.chain.height() != since_height {
            debug!(
                "[cc-03] Round at height {} already closed, dropping tick attempt",
                since_height
            );
            self.state.close_round_if(since_height);
            return Ok(None);
        }

        let list = self.chain.pool_snapshot();
        if list.is_empty() {
            debug!("[cc-03] Ping pool empty, abandoning tick attempt");
            return Ok(None);
        }

        let prev_tick = self.chain.head();
        let credentials = Arc::clone(&self.credentials);
        let pow = self.validator.pow();
        let pings = list.len();
        let tick = tokio::task::spawn_blocking(move || mine_tick(&credentials, &pow, list, prev_tick))
            .await
            .map_err(|e| RoundError::MiningTask(e.to_string()))??;

        let height = self
            .chain
            .commit_tick(tick.clone(), |tick, head| {
                self.validator.validate_tick(tick, head).map(|_| ())
            })
            .map_err(RoundError::TickRejected)?;
        self.state.close_round_if(since_height);

        info!(
            "[cc-03] Tick {} appended at height {} with {} pings",
            tick.this_tick, height, pings
        );
        self.broadcast(GossipRoute::Tick, &tick).await?;
        Ok(Some(tick))
    }

    /// Ping loop; runs until aborted.
    pub async fn run_ping_loop(self: Arc<Self>) {
        info!("[cc-03] Ping loop started");
        loop {
            match self.try_produce_ping().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => self.log_round_error("ping", &e),
            }
            self.sleeper.sleep(self.config.poll_interval).await;
        }
    }

    /// Tick loop; runs until aborted.
    pub async fn run_tick_loop(self: Arc<Self>) {
        info!("[cc-03] Tick loop started");
        loop {
            match self.try_produce_tick().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => self.log_round_error("tick", &e),
            }
            self.sleeper.sleep(self.config.poll_interval).await;
        }
    }

    /// Spawn both loops. Calling again while they run is a no-op.
    pub fn spawn(self: &Arc<Self>) {
        let mut loops = self.loops.lock();
        if !loops.is_empty() {
            return;
        }
        loops.push(tokio::spawn(Arc::clone(self).run_ping_loop()));
        loops.push(tokio::spawn(Arc::clone(self).run_tick_loop()));
    }

    /// Abort both loops.
    pub fn shutdown(&self) {
        for handle in self.loops.lock().drain(..) {
            handle.abort();
        }
    }

    async fn broadcast<T: Serialize>(&self, route: GossipRoute, artifact: &T) -> Result<()> {
        let payload =
            serde_json::to_value(artifact).map_err(|e| RoundError::Serialization(e.to_string()))?;
        self.broadcaster.broadcast(route, payload).await;
        Ok(())
    }

    fn log_round_error(&self, stage: &str, e: &RoundError) {
        if e.is_recoverable() {
            warn!("[cc-03] Own {} discarded: {}", stage, e);
        } else {
            error!("[cc-03] {} production failed: {}", stage, e);
        }
    }

    fn receive_ping_inner(&self, ping: Ping) -> Result<SigningAddress> {
        let now = self.clock.now_secs();
        let (signer, _) = self
            .chain
            .admit_ping(ping, |ping, head, _| {
                self.validator.validate_ping(ping, head, now, None)
            })
            .map_err(RoundError::PingRejected)?;
        debug!("[cc-03] Pooled ping from {}", signer);
        Ok(signer)
    }

    fn receive_tick_inner(&self, tick: Tick) -> Result<usize> {
        let id = tick.this_tick.clone();
        let height = self
            .chain
            .commit_tick(tick, |tick, head| {
                self.validator.validate_tick(tick, head).map(|_| ())
            })
            .map_err(RoundError::TickRejected)?;
        self.state.close_round();
        info!("[cc-03] Accepted tick {} at height {}", id, height);
        Ok(height)
    }
}

#[async_trait]
impl<R, B> RoundApi for RoundSynchronizer<R, B>
where
    R: ReadinessProbe + 'static,
    B: ArtifactBroadcaster + 'static,
{
    async fn receive_ping(&self, ping: Ping) -> Result<SigningAddress> {
        self.receive_ping_inner(ping)
    }

    async fn receive_tick(&self, tick: Tick) -> Result<usize> {
        self.receive_tick_inner(tick)
    }

    fn status(&self) -> RoundStatus {
        RoundStatus {
            length: self.chain.height(),
            head: self.chain.head(),
            pool_size: self.chain.pool_len(),
            stage: self.state.stage().as_str(),
        }
    }
}
