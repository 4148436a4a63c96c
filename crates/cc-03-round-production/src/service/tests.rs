use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shared_crypto::{Credentials, ProofOfWork};
use shared_types::{GossipRoute, Ping, Sleeper, Tick, TickRef, TimeSource, TokioSleeper};
use tokio::sync::{Notify, Semaphore};

use super::*;
use crate::domain::{RoundStage, ValidationError};

const NOW: u64 = 1_700_000_000;

// =============================================================================
// Mocks
// =============================================================================

struct ReadyFlag(AtomicBool);

impl ReadyFlag {
    fn new(ready: bool) -> Self {
        Self(AtomicBool::new(ready))
    }
}

impl ReadinessProbe for ReadyFlag {
    fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RecordingBroadcaster {
    sent: Mutex<Vec<(GossipRoute, Value)>>,
}

impl RecordingBroadcaster {
    fn routes(&self) -> Vec<GossipRoute> {
        self.sent.lock().iter().map(|(route, _)| *route).collect()
    }

    fn last_payload(&self) -> Option<Value> {
        self.sent.lock().last().map(|(_, payload)| payload.clone())
    }
}

#[async_trait]
impl ArtifactBroadcaster for RecordingBroadcaster {
    async fn broadcast(&self, route: GossipRoute, payload: Value) {
        self.sent.lock().push((route, payload));
    }
}

struct FixedClock(AtomicU64);

impl TimeSource for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}

/// Holds every sleep until the test releases it.
struct GatedSleeper {
    entered: Notify,
    gate: Semaphore,
}

impl GatedSleeper {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Sleeper for GatedSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.entered.notify_one();
        self.gate.acquire().await.unwrap().forget();
    }
}

type TestSynchronizer = RoundSynchronizer<ReadyFlag, RecordingBroadcaster>;

struct Fixture {
    sync: Arc<TestSynchronizer>,
    readiness: Arc<ReadyFlag>,
    broadcaster: Arc<RecordingBroadcaster>,
    sleeper: Arc<RecordingSleeper>,
}

fn config() -> RoundConfig {
    RoundConfig {
        tick_period: Duration::from_secs(10),
        tick_period_margin: Duration::from_secs(3),
        ..RoundConfig::for_testing()
    }
}

fn fixture_with(seed: u8, ready: bool) -> Fixture {
    let readiness = Arc::new(ReadyFlag::new(ready));
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let sleeper = Arc::new(RecordingSleeper::default());
    let sync = Arc::new(RoundSynchronizer::new(
        config(),
        Arc::new(Clockchain::new()),
        Arc::new(Credentials::from_seed([seed; 32])),
        Arc::clone(&readiness),
        Arc::clone(&broadcaster),
        Arc::new(FixedClock(AtomicU64::new(NOW))),
        sleeper.clone(),
    ));
    Fixture {
        sync,
        readiness,
        broadcaster,
        sleeper,
    }
}

fn fixture() -> Fixture {
    fixture_with(1, true)
}

fn remote_ping(seed: u8, reference: &TickRef) -> Ping {
    mine_ping(
        &Credentials::from_seed([seed; 32]),
        &ProofOfWork::new(config().pow_difficulty_bits),
        NOW,
        reference.clone(),
    )
    .unwrap()
}

fn remote_tick(seed: u8, list: Vec<Ping>, prev: &TickRef) -> Tick {
    mine_tick(
        &Credentials::from_seed([seed; 32]),
        &ProofOfWork::new(config().pow_difficulty_bits),
        list,
        prev.clone(),
    )
    .unwrap()
}

// =============================================================================
// Ping production
// =============================================================================

#[tokio::test]
async fn test_no_ping_while_not_ready() {
    let f = fixture_with(1, false);

    assert_eq!(f.sync.try_produce_ping().await.unwrap(), None);
    assert_eq!(f.sync.chain().pool_len(), 0);
    assert!(f.broadcaster.routes().is_empty());
}

#[tokio::test]
async fn test_ready_node_pools_and_broadcasts_ping() {
    let f = fixture();

    let ping = f.sync.try_produce_ping().await.unwrap().unwrap();

    assert_eq!(ping.reference, TickRef::genesis());
    assert_eq!(ping.timestamp, NOW);
    assert_eq!(f.sync.chain().pool_len(), 1);
    assert_eq!(
        f.sync.state().stage(),
        RoundStage::CollectingTick { since_height: 0 }
    );
    assert_eq!(f.broadcaster.routes(), vec![GossipRoute::Ping]);

    let sent: Ping = serde_json::from_value(f.broadcaster.last_payload().unwrap()).unwrap();
    assert_eq!(sent, ping);
}

#[tokio::test]
async fn test_one_own_ping_per_round() {
    let f = fixture();

    assert!(f.sync.try_produce_ping().await.unwrap().is_some());
    assert_eq!(f.sync.try_produce_ping().await.unwrap(), None);
    assert_eq!(f.sync.chain().pool_len(), 1);
}

// =============================================================================
// Tick production
// =============================================================================

#[tokio::test]
async fn test_no_tick_without_own_ping() {
    let f = fixture();

    assert_eq!(f.sync.try_produce_tick().await.unwrap(), None);
    assert!(f.sleeper.slept.lock().is_empty());
}

#[tokio::test]
async fn test_tick_bundles_pool_after_period_and_margin() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();
    f.sync
        .receive_ping(remote_ping(2, &TickRef::genesis()))
        .await
        .unwrap();

    let tick = f.sync.try_produce_tick().await.unwrap().unwrap();

    assert_eq!(*f.sleeper.slept.lock(), vec![Duration::from_secs(13)]);
    assert_eq!(tick.list.len(), 2);
    assert_eq!(tick.prev_tick, TickRef::genesis());
    assert_eq!(f.sync.chain().height(), 1);
    assert_eq!(f.sync.chain().head(), tick.this_tick);
    assert_eq!(f.sync.chain().pool_len(), 0);
    assert_eq!(f.sync.state().stage(), RoundStage::CollectingPing);
    assert_eq!(
        f.broadcaster.routes(),
        vec![GossipRoute::Ping, GossipRoute::Tick]
    );
}

#[tokio::test]
async fn test_next_ping_references_new_head() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();
    let tick = f.sync.try_produce_tick().await.unwrap().unwrap();

    let ping = f.sync.try_produce_ping().await.unwrap().unwrap();
    assert_eq!(ping.reference, tick.this_tick);
}

#[tokio::test]
async fn test_tick_dropped_when_round_closed_during_wait() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();

    // Another tick lands between our ping and our tick.
    let foreign = remote_tick(3, f.sync.chain().pool_snapshot(), &TickRef::genesis());
    f.sync
        .chain()
        .commit_tick(foreign, |_, _| Ok(()))
        .unwrap();

    assert_eq!(f.sync.try_produce_tick().await.unwrap(), None);
    assert_eq!(f.sync.chain().height(), 1);
    assert_eq!(f.sync.state().stage(), RoundStage::CollectingPing);
    assert_eq!(f.broadcaster.routes(), vec![GossipRoute::Ping]);
}

#[tokio::test]
async fn test_late_tick_attempt_keeps_next_round_open() {
    let sleeper = Arc::new(GatedSleeper::new());
    let sync = Arc::new(RoundSynchronizer::new(
        config(),
        Arc::new(Clockchain::new()),
        Arc::new(Credentials::from_seed([1; 32])),
        Arc::new(ReadyFlag::new(true)),
        Arc::new(RecordingBroadcaster::default()),
        Arc::new(FixedClock(AtomicU64::new(NOW))),
        sleeper.clone(),
    ));

    sync.try_produce_ping().await.unwrap().unwrap();
    let attempt = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.try_produce_tick().await }
    });
    sleeper.entered.notified().await;

    // Round 0 closes elsewhere while the attempt waits, and our ping for
    // round 1 is pooled before it wakes.
    let foreign = remote_tick(3, sync.chain().pool_snapshot(), &TickRef::genesis());
    sync.receive_tick(foreign).await.unwrap();
    sync.try_produce_ping().await.unwrap().unwrap();
    assert_eq!(
        sync.state().stage(),
        RoundStage::CollectingTick { since_height: 1 }
    );

    sleeper.release();
    assert_eq!(attempt.await.unwrap().unwrap(), None);
    assert_eq!(
        sync.state().stage(),
        RoundStage::CollectingTick { since_height: 1 }
    );
    assert_eq!(sync.chain().pool_len(), 1);

    // The next attempt closes round 1 with our own tick.
    sleeper.release();
    let tick = sync.try_produce_tick().await.unwrap().expect("tick for round 1");
    assert_eq!(tick.list.len(), 1);
    assert_eq!(sync.chain().height(), 2);
    assert_eq!(sync.state().stage(), RoundStage::CollectingPing);
}

#[tokio::test]
async fn test_no_tick_while_not_ready() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();
    f.readiness.0.store(false, Ordering::SeqCst);

    assert_eq!(f.sync.try_produce_tick().await.unwrap(), None);
    assert_eq!(f.sync.chain().height(), 0);
}

// =============================================================================
// Gossiped artifacts
// =============================================================================

#[tokio::test]
async fn test_receive_ping_replaces_earlier_ping_from_same_signer() {
    let f = fixture();
    let first = remote_ping(2, &TickRef::genesis());
    let second = mine_ping(
        &Credentials::from_seed([2; 32]),
        &ProofOfWork::new(config().pow_difficulty_bits),
        NOW + 1,
        TickRef::genesis(),
    )
    .unwrap();

    let signer = f.sync.receive_ping(first).await.unwrap();
    assert_eq!(&signer, Credentials::from_seed([2; 32]).signing_address());
    assert_eq!(f.sync.receive_ping(second.clone()).await.unwrap(), signer);

    assert_eq!(f.sync.chain().pool_len(), 1);
    assert_eq!(f.sync.chain().pool_snapshot(), vec![second]);
}

#[tokio::test]
async fn test_own_ping_rejected_when_signer_already_pooled() {
    let f = fixture();
    // Our own key, arriving back over gossip before the ping loop ran.
    let echoed = remote_ping(1, &TickRef::genesis());
    f.sync.receive_ping(echoed).await.unwrap();

    let result = f.sync.try_produce_ping().await;
    assert!(matches!(
        result,
        Err(RoundError::PingRejected(ValidationError::AlreadyPooled(_)))
    ));
    assert_eq!(f.sync.chain().pool_len(), 1);
    assert_eq!(f.sync.state().stage(), RoundStage::CollectingPing);
}

#[tokio::test]
async fn test_receive_ping_on_stale_head_rejected() {
    let f = fixture();
    let ping = remote_ping(2, &TickRef::new("not-the-head"));

    let result = f.sync.receive_ping(ping).await;
    assert!(matches!(
        result,
        Err(RoundError::PingRejected(ValidationError::StaleReference { .. }))
    ));
}

#[tokio::test]
async fn test_receive_tick_closes_round() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();
    let tick = remote_tick(3, f.sync.chain().pool_snapshot(), &TickRef::genesis());

    assert_eq!(f.sync.receive_tick(tick.clone()).await.unwrap(), 1);
    assert_eq!(f.sync.chain().head(), tick.this_tick);
    assert_eq!(f.sync.chain().pool_len(), 0);
    assert_eq!(f.sync.state().stage(), RoundStage::CollectingPing);

    // Round closed, so our own tick attempt is a no-op.
    assert_eq!(f.sync.try_produce_tick().await.unwrap(), None);
}

#[tokio::test]
async fn test_receive_unlinked_tick_rejected() {
    let f = fixture();
    let other = TickRef::new("fork");
    let tick = remote_tick(3, vec![remote_ping(2, &other)], &other);

    let result = f.sync.receive_tick(tick).await;
    assert!(matches!(
        result,
        Err(RoundError::TickRejected(ValidationError::StaleReference { .. }))
    ));
    assert_eq!(f.sync.chain().height(), 0);
}

#[tokio::test]
async fn test_status_reflects_chain_and_stage() {
    let f = fixture();
    f.sync.try_produce_ping().await.unwrap();

    let status = f.sync.status();
    assert_eq!(status.length, 0);
    assert_eq!(status.head, TickRef::genesis());
    assert_eq!(status.pool_size, 1);
    assert_eq!(status.stage, "collecting_tick");
}

#[tokio::test]
async fn test_two_nodes_converge_on_one_tick() {
    let a = fixture_with(1, true);
    let b = fixture_with(2, true);

    let ping_a = a.sync.try_produce_ping().await.unwrap().unwrap();
    let ping_b = b.sync.try_produce_ping().await.unwrap().unwrap();
    b.sync.receive_ping(ping_a).await.unwrap();
    a.sync.receive_ping(ping_b).await.unwrap();

    let tick = a.sync.try_produce_tick().await.unwrap().unwrap();
    b.sync.receive_tick(tick.clone()).await.unwrap();

    assert_eq!(a.sync.chain().head(), b.sync.chain().head());
    assert_eq!(b.sync.chain().ticks(), vec![tick]);
    assert_eq!(b.sync.try_produce_tick().await.unwrap(), None);
}

// =============================================================================
// Loops
// =============================================================================

#[tokio::test]
async fn test_spawned_loops_extend_chain() {
    let sync = Arc::new(RoundSynchronizer::new(
        RoundConfig::for_testing(),
        Arc::new(Clockchain::new()),
        Arc::new(Credentials::from_seed([7; 32])),
        Arc::new(ReadyFlag::new(true)),
        Arc::new(RecordingBroadcaster::default()),
        Arc::new(FixedClock(AtomicU64::new(NOW))),
        Arc::new(TokioSleeper),
    ));

    sync.spawn();
    let grown = tokio::time::timeout(Duration::from_secs(10), async {
        while sync.chain().height() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    sync.shutdown();

    assert!(grown.is_ok(), "chain did not grow");
    let ticks = sync.chain().ticks();
    assert_eq!(ticks[1].prev_tick, ticks[0].this_tick);
}
