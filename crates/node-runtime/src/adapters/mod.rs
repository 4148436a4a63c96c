//! # Adapters
//!
//! Port implementations connecting the subsystems to each other and to the
//! network.
//!
//! - `http_transport` - reqwest client implementing the discovery and gossip
//!   transports
//! - `ports` - in-process bridges between subsystem ports

pub mod http_transport;
pub mod ports;

pub use http_transport::HttpTransport;
pub use ports::{DiscoveryReadiness, GossipBroadcaster, RegistryDirectory};
