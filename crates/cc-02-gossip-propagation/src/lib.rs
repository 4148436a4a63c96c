//! # Gossip Propagation Subsystem (cc-02)
//!
//! Relays pings and ticks to every known peer using hop-limited flooding.
//!
//! ## Architecture Role
//!
//! ```text
//! [Round Production (3)] ──forward(hops=0)──→ [Gossip (2)]
//!                                                  │
//!                          snapshot of registry, minus origin
//!                                  ┌───────────────┴───────────────┐
//!                                  ↓                               ↓
//!                  POST /forward/{route}?addr&redistribute     [Peer B] ...
//!                        up to 3 retries, 0.5s apart
//!                        exhausted → evict from registry
//! ```
//!
//! Inbound payloads pass through the [`DuplicateCache`] before anything
//! else looks at them; a payload seen within the cache window is dropped.

pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use domain::*;
pub use events::GossipError;
pub use ports::inbound::GossipApi;
pub use ports::outbound::{GossipTransport, PeerDirectory};
pub use service::GossipForwarder;
