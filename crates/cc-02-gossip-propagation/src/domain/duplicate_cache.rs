//! # Duplicate Suppression Cache
//!
//! Time- and size-bounded set of payload fingerprints.
//!
//! Entries expire `max_age` seconds after insertion and are then treated as
//! absent. When more than `max_len` fingerprints are held the oldest go
//! first. The check and the insert happen under one lock, so two concurrent
//! deliveries of the same payload cannot both be reported as new.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{fingerprint, Fingerprint, TimeSource};

#[derive(Debug, Default)]
struct CacheState {
    /// Fingerprint → insertion time.
    entries: HashMap<Fingerprint, u64>,
    /// Insertion order. May hold stale pairs for fingerprints that were
    /// re-inserted after expiring; those are skipped on eviction.
    order: VecDeque<(Fingerprint, u64)>,
}

impl CacheState {
    fn remove_if_current(&mut self, key: &Fingerprint, inserted_at: u64) {
        if self.entries.get(key) == Some(&inserted_at) {
            self.entries.remove(key);
        }
    }

    fn purge_expired(&mut self, now: u64, max_age: u64) {
        while let Some(&(key, inserted_at)) = self.order.front() {
            if now.saturating_sub(inserted_at) < max_age {
                break;
            }
            self.order.pop_front();
            self.remove_if_current(&key, inserted_at);
        }
    }

    fn record(&mut self, key: Fingerprint, now: u64, max_len: usize) {
        self.entries.insert(key, now);
        self.order.push_back((key, now));
        self.evict_overflow(max_len);
    }

    fn evict_overflow(&mut self, max_len: usize) {
        while self.entries.len() > max_len {
            match self.order.pop_front() {
                Some((key, inserted_at)) => self.remove_if_current(&key, inserted_at),
                None => break,
            }
        }
    }
}

/// Expiring membership test over payload fingerprints.
pub struct DuplicateCache {
    state: Mutex<CacheState>,
    max_len: usize,
    max_age_secs: u64,
    clock: Arc<dyn TimeSource>,
}

impl DuplicateCache {
    pub fn new(max_len: usize, max_age_secs: u64, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_len: max_len.max(1),
            max_age_secs,
            clock,
        }
    }

    /// True if an identical payload was seen within the window; otherwise
    /// records it and returns false.
    pub fn seen_before<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        self.seen_fingerprint(fingerprint(payload))
    }

    pub fn seen_fingerprint(&self, key: Fingerprint) -> bool {
        let now = self.clock.now_secs();
        let mut state = self.state.lock();
        state.purge_expired(now, self.max_age_secs);

        if let Some(&inserted_at) = state.entries.get(&key) {
            if now.saturating_sub(inserted_at) < self.max_age_secs {
                return true;
            }
        }

        state.record(key, now, self.max_len);
        false
    }

    /// Record a payload without asking whether it was seen, restarting its
    /// window if it was.
    pub fn mark_seen<T: Serialize + ?Sized>(&self, payload: &T) {
        let key = fingerprint(payload);
        let now = self.clock.now_secs();
        let mut state = self.state.lock();
        state.purge_expired(now, self.max_age_secs);
        state.record(key, now, self.max_len);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

impl std::fmt::Debug for DuplicateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateCache")
            .field("len", &self.len())
            .field("max_len", &self.max_len)
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}
