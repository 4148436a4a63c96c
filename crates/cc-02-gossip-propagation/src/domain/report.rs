use shared_types::{HopCount, PeerUrl};

/// What one `forward` call did. Informational only: delivery is never
/// acknowledged end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardReport {
    /// Hop count attached to the relayed payload; `None` if nothing was relayed.
    pub hops: Option<HopCount>,
    /// Destinations the payload was sent to.
    pub attempted: usize,
    pub delivered: usize,
    /// Destinations removed from the registry after exhausting retries.
    pub evicted: Vec<PeerUrl>,
}

impl ForwardReport {
    pub fn not_relayed() -> Self {
        Self::default()
    }

    pub fn relayed(&self) -> bool {
        self.hops.is_some()
    }
}
