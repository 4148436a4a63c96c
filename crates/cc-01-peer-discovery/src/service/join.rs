//! Join worker and maintenance loop.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::ports::inbound::PeerDiscoveryApi;
use crate::ports::outbound::DiscoveryTransport;
use crate::service::DiscoveryService;

impl<T: DiscoveryTransport + 'static> DiscoveryService<T> {
    /// Record the listening port and restart the join countdown.
    ///
    /// Called once per bind attempt; only the last call within
    /// `port_timer_timeout` leads to the join worker starting.
    pub fn set_port(self: &Arc<Self>, port: u16) {
        self.port.store(port, Ordering::SeqCst);
        debug!(port, "[cc-01] Port set, restarting join countdown");

        let service = Arc::clone(self);
        self.debounce.reset(move || async move {
            service.activate();
        });
    }

    /// Start the join worker. Only the first call per process has an effect.
    pub fn activate(self: &Arc<Self>) -> bool {
        if self.join_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(port = ?self.local_port(), "[cc-01] Starting join worker");
        let handle = tokio::spawn(Arc::clone(self).join_worker());
        *self.worker.lock() = Some(handle);
        true
    }

    async fn join_worker(self: Arc<Self>) {
        self.sleeper.sleep(self.startup_delay()).await;
        self.join_network().await;

        loop {
            self.sleeper.sleep(self.config.maintenance_interval).await;
            self.maintenance_round().await;
        }
    }

    fn startup_delay(&self) -> Duration {
        let jitter_ms = self.config.join_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.config.join_base_delay + Duration::from_millis(extra)
    }

    /// Initial bootstrap from the seeds.
    ///
    /// Nodes below the joiner port threshold are the seeds themselves and
    /// mutual-add each other directly; every node then adds a sample of the
    /// seeds' peers.
    pub async fn join_network(&self) {
        let seeds = &self.config.seeds;
        if self.port.load(Ordering::SeqCst) < self.config.joiner_port_threshold {
            let added = self.mutual_add(seeds).await;
            debug!(added, "[cc-01] Mutual-added seeds directly");
        }

        let sample = self
            .sample_further_peers(seeds, self.config.max_peers)
            .await;
        let added = self.mutual_add(&sample).await;
        info!(
            added,
            peers = self.registry.len(),
            "[cc-01] Joined network from {} seeds",
            seeds.len()
        );
    }

    /// One pass of the maintenance loop.
    pub async fn maintenance_round(&self) {
        if self.registry.len() < self.config.min_peers {
            let current = self.registry.urls();
            let sample = self
                .sample_further_peers(&current, self.config.max_peers)
                .await;
            self.mutual_add(&sample).await;
            self.set_ready(false);
        } else {
            self.set_ready(true);
        }

        if self.registry.is_empty() {
            info!("[cc-01] No peers left, re-bootstrapping from seeds");
            let seeds = &self.config.seeds;
            self.mutual_add(seeds).await;
            let sample = self
                .sample_further_peers(seeds, self.config.max_peers)
                .await;
            self.mutual_add(&sample).await;
        }
    }
}
