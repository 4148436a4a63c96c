//! Domain layer: pure peer-table logic, no I/O.

pub mod config;
pub mod errors;
pub mod registry;
pub mod sampling;

pub use config::DiscoveryConfig;
pub use errors::{DiscoveryError, RegistryError};
pub use registry::PeerRegistry;
pub use sampling::{merge_candidates, sample_candidates};
