//! # Peer Discovery Subsystem (cc-01)
//!
//! Maintains the table of known peers and drives the join protocol that
//! fills it.
//!
//! ## Architecture
//!
//! - **Domain Layer:** [`PeerRegistry`] with its no-self, no-duplicate and
//!   capacity invariants; peer-list merging and sampling.
//! - **Ports Layer:** [`DiscoveryTransport`] for the two outbound calls
//!   (`/mutual_add`, `/info/peers`), [`PeerDiscoveryApi`] for consumers.
//! - **Service Layer:** [`DiscoveryService`] with the debounced join worker
//!   and the maintenance loop.
//!
//! ## Join Flow
//!
//! ```text
//! set_port ──(debounce)──→ join worker
//!                              │ 2s + jitter
//!                              ↓
//!            mutual-add seeds (port < 5003 only)
//!                              ↓
//!            sample peers-of-seeds → mutual-add
//!                              ↓
//!            every 4s: maintenance_round()
//!              size < min_peers → sample own peers, ready = false
//!              otherwise        → ready = true
//!              size == 0        → re-bootstrap from seeds
//! ```

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::inbound::PeerDiscoveryApi;
pub use ports::outbound::{DiscoveryTransport, MutualAddReply};
pub use service::{DebounceTimer, DiscoveryService};
