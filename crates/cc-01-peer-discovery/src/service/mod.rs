//! # Peer Discovery Service
//!
//! Wraps the [`PeerRegistry`](crate::domain::PeerRegistry) with the join
//! protocol: signed mutual-add, peers-of-peers sampling, the debounced join
//! worker and the maintenance loop that decides readiness.

// Semantic submodules
mod api;
mod core;
mod debounce;
mod join;

// Re-export public API
pub use core::DiscoveryService;
pub use debounce::DebounceTimer;
