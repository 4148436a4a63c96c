use std::net::IpAddr;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use shared_types::{JoinRequest, PeerUrl, SigningAddress};

use crate::domain::DiscoveryError;
use crate::ports::inbound::PeerDiscoveryApi;
use crate::ports::outbound::DiscoveryTransport;
use crate::service::DiscoveryService;

#[async_trait]
impl<T: DiscoveryTransport> PeerDiscoveryApi for DiscoveryService<T> {
    async fn mutual_add(&self, candidates: &[PeerUrl]) -> usize {
        self.mutual_add_inner(candidates).await
    }

    async fn sample_further_peers(&self, from: &[PeerUrl], sample_size: usize) -> Vec<PeerUrl> {
        self.sample_further_peers_inner(from, sample_size).await
    }

    fn accept_join(
        &self,
        remote_ip: IpAddr,
        request: &JoinRequest,
    ) -> Result<SigningAddress, DiscoveryError> {
        self.accept_join_inner(remote_ip, request)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
