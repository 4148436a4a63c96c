//! # Subsystem Container
//!
//! Central container holding the subsystem instances with their adapters
//! wired in, plus the node configuration they were built from.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::{NodeContainer, NodeTransport};
