use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_crypto::{verify_hex, Credentials};
use shared_types::{JoinBody, JoinRequest, PeerUrl, SigningAddress, Sleeper, TransportError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{
    merge_candidates, sample_candidates, DiscoveryConfig, DiscoveryError, PeerRegistry,
    RegistryError,
};
use crate::ports::outbound::{DiscoveryTransport, MutualAddReply};
use crate::service::DebounceTimer;

/// Peer discovery service.
///
/// ## Thread Safety
///
/// Shared across tasks via `Arc`. The registry synchronizes itself; the
/// remaining state is atomics plus the debounce timer's own lock.
pub struct DiscoveryService<T: DiscoveryTransport> {
    pub(super) config: DiscoveryConfig,
    pub(super) registry: Arc<PeerRegistry>,
    pub(super) transport: Arc<T>,
    pub(super) credentials: Arc<Credentials>,
    pub(super) sleeper: Arc<dyn Sleeper>,
    /// Listening port; 0 until `set_port` is called.
    pub(super) port: AtomicU16,
    pub(super) ready: AtomicBool,
    pub(super) join_started: AtomicBool,
    pub(super) debounce: DebounceTimer,
    pub(super) worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: DiscoveryTransport> DiscoveryService<T> {
    pub fn new(
        config: DiscoveryConfig,
        registry: Arc<PeerRegistry>,
        transport: Arc<T>,
        credentials: Arc<Credentials>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            debounce: DebounceTimer::new(config.port_timer_timeout),
            config,
            registry,
            transport,
            credentials,
            sleeper,
            port: AtomicU16::new(0),
            ready: AtomicBool::new(false),
            join_started: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Port most recently passed to `set_port`, if any.
    pub fn local_port(&self) -> Option<u16> {
        match self.port.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }

    /// Whether the join worker has been started.
    pub fn join_started(&self) -> bool {
        self.join_started.load(Ordering::SeqCst)
    }

    /// Stop the join countdown and the join worker.
    pub fn shutdown(&self) {
        self.debounce.cancel();
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
    }

    pub(super) fn set_ready(&self, ready: bool) {
        let was = self.ready.swap(ready, Ordering::SeqCst);
        if was != ready {
            info!(
                peers = self.registry.len(),
                "[cc-01] Node readiness changed: {was} -> {ready}"
            );
        }
    }

    /// Build the signed request sent to `/mutual_add`.
    pub fn join_request(&self) -> JoinRequest {
        let port = self.port.load(Ordering::SeqCst);
        let pubkey = self.credentials.pubkey_hex();
        let body = JoinBody { port, pubkey };
        JoinRequest {
            port,
            pubkey: pubkey.to_string(),
            signature: self.credentials.sign_hex(&body.encode()),
        }
    }

    pub(super) async fn mutual_add_inner(&self, candidates: &[PeerUrl]) -> usize {
        let request = self.join_request();
        let mut added = 0;

        for candidate in candidates {
            if self.registry.contains(candidate) {
                continue;
            }
            if self.registry.is_full() {
                debug!("[cc-01] Peer table full, stopping mutual-add");
                break;
            }

            match self.transport.request_mutual_add(candidate, &request).await {
                Ok(MutualAddReply::Accepted(remote)) => {
                    match self.registry.try_register(candidate.as_str(), remote) {
                        Ok(url) => {
                            added += 1;
                            info!(peer = %url, "[cc-01] Added peer via mutual-add");
                        }
                        Err(RegistryError::AlreadyRegistered) => {}
                        Err(e) => debug!(peer = %candidate, "[cc-01] Not registering: {e}"),
                    }
                }
                Ok(MutualAddReply::AtCapacity) => {
                    info!(peer = %candidate, "[cc-01] Peer at peer-maximum");
                }
                Ok(MutualAddReply::Rejected(status)) => {
                    debug!(peer = %candidate, status, "[cc-01] Mutual-add rejected");
                }
                Err(e) => log_transport_failure(candidate, "mutual-add", &e),
            }
        }

        added
    }

    pub(super) async fn sample_further_peers_inner(
        &self,
        from: &[PeerUrl],
        sample_size: usize,
    ) -> Vec<PeerUrl> {
        let mut lists = Vec::with_capacity(from.len());
        for peer in from {
            match self.transport.fetch_peers(peer).await {
                Ok(list) => lists.push(list),
                Err(e) => log_transport_failure(peer, "peer-list fetch", &e),
            }
        }

        let candidates = merge_candidates(lists);
        sample_candidates(&candidates, sample_size, &mut rand::thread_rng())
    }

    pub(super) fn accept_join_inner(
        &self,
        remote_ip: IpAddr,
        request: &JoinRequest,
    ) -> Result<SigningAddress, DiscoveryError> {
        verify_hex(&request.pubkey, &request.body().encode(), &request.signature)
            .map_err(|_| DiscoveryError::InvalidSignature)?;
        let signer = SigningAddress::from_public_key_hex(&request.pubkey)
            .ok_or(DiscoveryError::InvalidSignature)?;

        let url = PeerUrl::from_socket(SocketAddr::new(remote_ip, request.port));
        match self.registry.try_register(url.as_str(), signer) {
            Ok(url) => {
                info!(peer = %url, "[cc-01] Registered peer from join request");
                Ok(self.credentials.signing_address().clone())
            }
            Err(RegistryError::AlreadyRegistered) => {
                Ok(self.credentials.signing_address().clone())
            }
            Err(RegistryError::SelfRegistration) => Err(DiscoveryError::SelfJoin),
            Err(RegistryError::AtCapacity) => Err(DiscoveryError::AtCapacity),
            Err(RegistryError::InvalidAddress(e)) => Err(DiscoveryError::InvalidAddress(e)),
        }
    }
}

fn log_transport_failure(peer: &PeerUrl, what: &str, error: &TransportError) {
    if error.is_transport() {
        debug!(peer = %peer, "[cc-01] {what} failed: {error}");
    } else {
        warn!(peer = %peer, "[cc-01] {what} failed unexpectedly: {error}");
    }
}
