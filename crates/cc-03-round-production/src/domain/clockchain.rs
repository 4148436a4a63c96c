//! # Clockchain
//!
//! The append-only list of ticks plus the pool of pings collected for the
//! round that is still open.
//!
//! Lock order is always chain, then pool. Admitting a ping holds the chain
//! read lock so the head it was validated against cannot move before the
//! insert; committing a tick holds the chain write lock across the linkage
//! check, the append and the pool reset.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};
use shared_types::{Ping, SigningAddress, Tick, TickRef};

use super::validation::ValidationError;

/// Pings of the open round keyed by signer. Ordered so that a tick built
/// from the pool lists its pings deterministically.
pub type PingPool = BTreeMap<SigningAddress, Ping>;

/// Chain of committed ticks and the current ping pool.
#[derive(Debug)]
pub struct Clockchain {
    chain: RwLock<Vec<Tick>>,
    pool: Mutex<PingPool>,
    genesis: TickRef,
}

impl Default for Clockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Clockchain {
    /// Empty chain whose head is the genesis reference.
    pub fn new() -> Self {
        Self {
            chain: RwLock::new(Vec::new()),
            pool: Mutex::new(PingPool::new()),
            genesis: TickRef::genesis(),
        }
    }

    /// `this_tick` of the last tick, or the genesis reference.
    pub fn head(&self) -> TickRef {
        Self::head_of(&self.chain.read(), &self.genesis)
    }

    /// Number of committed ticks.
    pub fn height(&self) -> usize {
        self.chain.read().len()
    }

    /// Copy of every committed tick, oldest first.
    pub fn ticks(&self) -> Vec<Tick> {
        self.chain.read().clone()
    }

    /// Pooled pings ordered by signer.
    pub fn pool_snapshot(&self) -> Vec<Ping> {
        self.pool.lock().values().cloned().collect()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn pool_contains(&self, signer: &SigningAddress) -> bool {
        self.pool.lock().contains_key(signer)
    }

    /// Validate and pool a ping atomically.
    ///
    /// `check` sees the current head and pool and returns the ping's signer.
    /// A ping from a signer already in the pool replaces the earlier one.
    /// Returns the signer and the chain height the ping was pooled at.
    pub fn admit_ping<F>(
        &self,
        ping: Ping,
        check: F,
    ) -> Result<(SigningAddress, usize), ValidationError>
    where
        F: FnOnce(&Ping, &TickRef, &PingPool) -> Result<SigningAddress, ValidationError>,
    {
        let chain = self.chain.read();
        let head = Self::head_of(&chain, &self.genesis);
        let mut pool = self.pool.lock();

        let signer = check(&ping, &head, &pool)?;
        pool.insert(signer.clone(), ping);
        Ok((signer, chain.len()))
    }

    /// Validate, append and reset the pool atomically.
    ///
    /// `check` sees the head the tick must link to. Returns the new height.
    pub fn commit_tick<F>(&self, tick: Tick, check: F) -> Result<usize, ValidationError>
    where
        F: FnOnce(&Tick, &TickRef) -> Result<(), ValidationError>,
    {
        let mut chain = self.chain.write();
        let head = Self::head_of(&chain, &self.genesis);
        check(&tick, &head)?;

        let mut pool = self.pool.lock();
        chain.push(tick);
        pool.clear();
        Ok(chain.len())
    }

    fn head_of(chain: &[Tick], genesis: &TickRef) -> TickRef {
        chain
            .last()
            .map(|tick| tick.this_tick.clone())
            .unwrap_or_else(|| genesis.clone())
    }
}
